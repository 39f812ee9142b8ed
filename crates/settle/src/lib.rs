//! settle: converge a live Postgres cluster to a declared schema.
//!
//! Reconciliation only ever adds: databases, tables, columns, enum types and
//! enum values are created when missing and never dropped. Drift in an
//! existing object is reported, not corrected. The one exception is
//! unique/not-null constraints, which are rebuilt from the declaration on
//! every run.
//!
//! ```ignore
//! let loaded = settle_schema::load("config.styx".into())?;
//! let report = settle::run(&RunConfig::default(), &loaded.schema).await?;
//! ```

mod config;
mod error;
mod ledger;
mod outcome;
mod postgres;
mod reconcile;
mod store;
mod traced;

#[cfg(test)]
mod memory;

pub use config::{ConnectionConfig, LedgerConfig, RunConfig, SslMode};
pub use error::{Error, Result};
pub use ledger::{Ledger, ledger_table};
pub use outcome::{ObjectKind, Outcome, Progress, RunReport, Skipped, Status};
pub use postgres::{ConnectionProvider, PgServer, PgStore};
pub use reconcile::Reconciler;
pub use store::{AuditSink, Constraint, ConstraintType, Executor, Inspector, Server, Store};
pub use traced::{Connection, ConnectionExt, TracedConn};

// Re-export for convenience
pub use settle_schema::Schema;

/// Reconcile `schema` against the cluster described by `config`, then
/// record the outcomes in the audit ledger if one is configured.
///
/// Fails only if the cluster can't be reached at all. A connection lost
/// mid-run is reported in [`RunReport::aborted`].
pub async fn run(config: &RunConfig, schema: &Schema) -> Result<RunReport> {
    run_with_progress(config, schema, None).await
}

/// [`run`], announcing each outcome to `progress` as it happens.
pub async fn run_with_progress(
    config: &RunConfig,
    schema: &Schema,
    progress: Option<Progress>,
) -> Result<RunReport> {
    let server =
        PgServer::connect(config.connection.clone(), &config.maintenance_database).await?;
    Ok(run_on(&server, schema, config.ledger.as_ref(), progress).await)
}

/// [`run_with_progress`] against any [`Server`].
///
/// The ledger is written even after an aborted run, so the outcomes that did
/// happen are recorded if the server can still be reached.
pub async fn run_on<S: Server>(
    server: &S,
    schema: &Schema,
    ledger: Option<&LedgerConfig>,
    progress: Option<Progress>,
) -> RunReport {
    let mut reconciler = Reconciler::new(server);
    if let Some(progress) = progress {
        reconciler = reconciler.with_progress(progress);
    }
    let mut report = reconciler.run(schema).await;
    if let Some(config) = ledger {
        ledger::record(server, config, &mut report).await;
    }
    report
}
