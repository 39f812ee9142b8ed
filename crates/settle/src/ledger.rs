//! The audit ledger: one row per outcome, appended after every run.
//!
//! The ledger's own database and table are brought into existence through
//! the same reconciliation path as everything else, minus the naming gate
//! (its default database, `info`, is reserved precisely so nobody else
//! declares it).

use crate::config::LedgerConfig;
use crate::outcome::{Outcome, RunReport, Status};
use crate::reconcile::{Reconciler, Session};
use crate::store::{Server, Store};
use crate::{Error, Result};
use chrono::Utc;
use settle_schema::{ColumnSpec, LogicalType, TableSpec};

/// The ledger table as a declaration.
pub fn ledger_table(name: &str) -> TableSpec {
    let text = |column: &str| ColumnSpec::new(column, LogicalType::Text);
    TableSpec::new(name)
        .column(text("table_name").required())
        .column(text("parent_table_name").required())
        .column(text("table_type").required())
        .column(text("database_name").required())
        .column(text("entry_id").required())
        .column(text("remote_id"))
        .column(ColumnSpec::new("sync_timestamp", LogicalType::Timestamptz))
        .column(ColumnSpec::enumeration(
            "status",
            Status::ALL.map(Status::label),
        ))
}

/// An open, bootstrapped ledger.
pub struct Ledger<St: Store> {
    store: St,
    table: String,
}

impl<St: Store> Ledger<St> {
    /// Make sure the ledger database and table exist, then open them.
    pub async fn bootstrap<S>(server: &S, config: &LedgerConfig) -> Result<Self>
    where
        S: Server<Store = St>,
    {
        let mut reconciler = Reconciler::new(server);
        let store = reconciler.ensure_database(&config.database).await?;
        let mut report = reconciler.into_report();
        let Some(store) = store else {
            return Err(Error::Ledger(first_failure(&report)));
        };

        let spec = ledger_table(&config.table);
        Session::new(&store, &config.database, &mut report)
            .reconcile_table(&spec)
            .await?;
        if report.count(Status::Failed) > 0 {
            return Err(Error::Ledger(first_failure(&report)));
        }

        tracing::debug!(
            database = %config.database,
            table = %config.table,
            "audit ledger ready"
        );
        Ok(Self {
            store,
            table: config.table.clone(),
        })
    }

    /// Append one row per outcome, all stamped with the same time.
    pub async fn append(&self, outcomes: &[Outcome]) -> Result<()> {
        let at = Utc::now();
        for outcome in outcomes {
            self.store.append(&self.table, outcome, at).await?;
        }
        tracing::info!(rows = outcomes.len(), table = %self.table, "recorded outcomes");
        Ok(())
    }
}

fn first_failure(report: &RunReport) -> String {
    report
        .outcomes
        .iter()
        .find(|o| o.status == Status::Failed)
        .map(ToString::to_string)
        .unwrap_or_else(|| "bootstrap failed".to_string())
}

/// Bootstrap the ledger and append `report`'s outcomes to it.
///
/// Failures end up in `report.ledger_error`; the reconciliation itself has
/// already happened by now.
pub async fn record<S: Server>(server: &S, config: &LedgerConfig, report: &mut RunReport) {
    let result = async {
        let ledger = Ledger::bootstrap(server, config).await?;
        ledger.append(&report.outcomes).await
    }
    .await;

    if let Err(e) = result {
        tracing::error!(error = %e, "could not write the audit ledger");
        report.ledger_error = Some(e.to_string());
    }
}
