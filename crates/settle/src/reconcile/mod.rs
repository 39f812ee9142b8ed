//! The reconciliation engine.
//!
//! A run walks the schema strictly in order: database, then per table the
//! table itself, its tagging bundle, its descriptor tables, its declared
//! columns and finally its reserved columns. Every object gets exactly one
//! outcome. Failures are recorded and the walk moves on to the next object;
//! only a lost connection ends the run.

mod column;
mod descriptors;
mod reserved;
mod tagging;

use crate::outcome::{ObjectKind, Outcome, Progress, RunReport, Status};
use crate::store::{Executor, Inspector, Server, Store};
use crate::{Error, Result};
use settle_schema::naming::{self, NameClass};
use settle_schema::{ColumnSpec, DatabaseSpec, Schema, TableSpec};
use settle_sql::{CreateTable, DatabaseName, Ddl, TableName};

/// Drives one run against a [`Server`].
pub struct Reconciler<'s, S: Server> {
    server: &'s S,
    report: RunReport,
}

impl<'s, S: Server> Reconciler<'s, S> {
    pub fn new(server: &'s S) -> Self {
        Self {
            server,
            report: RunReport::default(),
        }
    }

    /// Announce each outcome to `progress` as it is recorded.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.report = RunReport::with_progress(progress);
        self
    }

    /// Reconcile every database in `schema`.
    ///
    /// A lost connection ends the run early. The report still holds every
    /// outcome up to that point, with the cause in [`RunReport::aborted`].
    pub async fn run(mut self, schema: &Schema) -> RunReport {
        for database in &schema.databases {
            if let Err(e) = self.reconcile_database(database).await {
                tracing::error!(
                    error = %e,
                    database = %database.name,
                    "connection lost, ending the run"
                );
                self.report.aborted = Some(e.to_string());
                break;
            }
        }
        self.report
    }

    async fn reconcile_database(&mut self, database: &DatabaseSpec) -> Result<()> {
        let violations = naming::check(NameClass::Database, &database.name);
        if !violations.is_empty() {
            self.report.skip(database.name.clone(), violations);
            return Ok(());
        }

        let Some(store) = self.ensure_database(&database.name).await? else {
            return Ok(());
        };

        let mut session = Session::new(&store, &database.name, &mut self.report);
        for table in &database.tables {
            let violations = naming::check(NameClass::Table, &table.name);
            if !violations.is_empty() {
                session
                    .report
                    .skip(format!("{}/{}", database.name, table.name), violations);
                continue;
            }
            session.reconcile_table(table).await?;
        }
        Ok(())
    }

    /// Make sure `name` exists and open it. `None` if it couldn't be created
    /// or opened; the failure is already recorded.
    ///
    /// This skips the naming gate, which lets the ledger bootstrap use it for
    /// the reserved `info` database.
    pub(crate) async fn ensure_database(&mut self, name: &str) -> Result<Option<S::Store>> {
        let target = Target {
            database: name,
            table: "",
            parent: None,
            kind: ObjectKind::Database,
            entry: name,
        };

        let result = async {
            if self.server.database_exists(name).await? {
                Ok(Status::AlreadyExists)
            } else {
                self.server.create_database(&DatabaseName::from(name)).await?;
                Ok(Status::Added)
            }
        }
        .await;
        if !conclude(&mut self.report, &target, result)? {
            return Ok(None);
        }

        match self.server.open(name).await {
            Ok(store) => Ok(Some(store)),
            Err(e) => {
                let detail = recover(e)?;
                let detail = format!("could not open: {detail}");
                self.report.record(target.outcome(Status::Failed, Some(detail)));
                Ok(None)
            }
        }
    }

    pub(crate) fn into_report(self) -> RunReport {
        self.report
    }
}

/// Reconciliation inside one open database.
pub(crate) struct Session<'r, St: Store> {
    store: &'r St,
    database: &'r str,
    pub(crate) report: &'r mut RunReport,
}

impl<'r, St: Store> Session<'r, St> {
    pub(crate) fn new(store: &'r St, database: &'r str, report: &'r mut RunReport) -> Self {
        Self {
            store,
            database,
            report,
        }
    }

    /// Reconcile a table that already passed the naming gate.
    pub(crate) async fn reconcile_table(&mut self, table: &TableSpec) -> Result<()> {
        let create = CreateTable::with_id(TableName::from(table.name.as_str()));
        if !self.ensure_table(create, ObjectKind::Table, None).await? {
            return Ok(());
        }

        if table.tagging {
            self.ensure_tagging(&table.name).await?;
        }

        if let Some(descriptors) = &table.descriptors {
            for descriptor in descriptors {
                self.reconcile_descriptor(&table.name, descriptor).await?;
            }
        }

        self.reconcile_columns(&table.name, None, &table.columns).await?;

        self.reconcile_reserved(table).await
    }

    async fn reconcile_columns(
        &mut self,
        table: &str,
        parent: Option<&str>,
        columns: &[ColumnSpec],
    ) -> Result<()> {
        for column in columns {
            let violations = naming::check(NameClass::Column, &column.name);
            if !violations.is_empty() {
                self.report.skip(
                    format!("{}/{table}.{}", self.database, column.name),
                    violations,
                );
                continue;
            }
            self.reconcile_column(table, parent, column).await?;
        }
        Ok(())
    }

    /// Create the table if it's missing. Returns whether it exists afterwards.
    async fn ensure_table(
        &mut self,
        create: CreateTable,
        kind: ObjectKind,
        parent: Option<&str>,
    ) -> Result<bool> {
        let name = create.name.to_string();
        let result = create_table(self.store, create).await;
        let target = self.target(&name, parent, kind, &name);
        conclude(self.report, &target, result)
    }

    fn target<'t>(
        &self,
        table: &'t str,
        parent: Option<&'t str>,
        kind: ObjectKind,
        entry: &'t str,
    ) -> Target<'t>
    where
        'r: 't,
    {
        Target {
            database: self.database,
            table,
            parent,
            kind,
            entry,
        }
    }
}

async fn create_table<St: Inspector + Executor>(store: &St, create: CreateTable) -> Result<Status> {
    if store.table_exists(create.name.as_str()).await? {
        return Ok(Status::AlreadyExists);
    }
    store.apply(&Ddl::CreateTable(create)).await?;
    Ok(Status::Added)
}

/// The object an outcome is about.
pub(crate) struct Target<'a> {
    database: &'a str,
    table: &'a str,
    parent: Option<&'a str>,
    kind: ObjectKind,
    entry: &'a str,
}

impl Target<'_> {
    fn outcome(&self, status: Status, detail: Option<String>) -> Outcome {
        Outcome {
            database: self.database.to_string(),
            table: self.table.to_string(),
            parent: self.parent.map(str::to_string),
            kind: self.kind,
            entry: self.entry.to_string(),
            status,
            detail,
        }
    }
}

/// Record the result of one step. Returns whether it succeeded.
fn conclude(report: &mut RunReport, target: &Target<'_>, result: Result<Status>) -> Result<bool> {
    match result {
        Ok(status) => {
            report.record(target.outcome(status, None));
            Ok(true)
        }
        Err(e) => {
            let detail = recover(e)?;
            report.record(target.outcome(Status::Failed, Some(detail)));
            Ok(false)
        }
    }
}

/// Turn a per-object failure into its detail message. Connection failures
/// are passed back up instead.
fn recover(error: Error) -> Result<String> {
    if error.is_connection_failure() {
        Err(error)
    } else {
        Ok(error.to_string())
    }
}
