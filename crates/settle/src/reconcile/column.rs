//! Column reconciliation: existence and type, constraints, comments.

use super::{Session, conclude, recover};
use crate::Result;
use crate::outcome::{ObjectKind, Status};
use crate::store::Store;
use settle_schema::{ColumnSpec, LogicalType};
use settle_sql::{
    ColumnDef, ColumnName, ConstraintKind, ConstraintName, Ddl, SqlType, TableName,
    comments_column, enum_type_name, not_null_constraint_name, unique_constraint_name,
};

/// Where a column stood before constraints were touched.
enum ColumnState {
    Created,
    Matches,
    /// Stored under a different type, which is reported and left alone.
    Mismatch(String),
}

impl<St: Store> Session<'_, St> {
    /// Reconcile one declared column against `table`.
    pub(crate) async fn reconcile_column(
        &mut self,
        table: &str,
        parent: Option<&str>,
        column: &ColumnSpec,
    ) -> Result<()> {
        let sql_type = column.sql_type(table);
        let target = self.target(table, parent, ObjectKind::Column, &column.name);

        let status = match self.ensure_column(table, parent, column, &sql_type).await {
            Ok(ColumnState::Created) => Status::Added,
            Ok(ColumnState::Matches) => Status::AlreadyExists,
            Ok(ColumnState::Mismatch(stored)) => {
                let detail = format!(
                    "stored as {stored}, declared {}; leaving the column as it is",
                    sql_type.catalog_name()
                );
                self.report
                    .record(target.outcome(Status::Failed, Some(detail)));
                return Ok(());
            }
            Err(e) => {
                let detail = recover(e)?;
                self.report
                    .record(target.outcome(Status::Failed, Some(detail)));
                return Ok(());
            }
        };

        match self.replace_constraints(table, column).await {
            Ok(()) => self.report.record(target.outcome(status, None)),
            Err(e) => {
                let detail = format!("constraints: {}", recover(e)?);
                self.report
                    .record(target.outcome(Status::Failed, Some(detail)));
            }
        }

        self.reconcile_comments(table, parent, column).await
    }

    async fn ensure_column(
        &mut self,
        table: &str,
        parent: Option<&str>,
        column: &ColumnSpec,
        sql_type: &SqlType,
    ) -> Result<ColumnState> {
        let store = self.store;
        match store.column_type(table, &column.name).await? {
            Some(stored) if stored == sql_type.catalog_name() => {
                if column.datatype == LogicalType::Enum {
                    self.sync_enum_values(table, parent, column).await?;
                }
                Ok(ColumnState::Matches)
            }
            Some(stored) => Ok(ColumnState::Mismatch(stored)),
            None => {
                if column.datatype == LogicalType::Enum {
                    self.ensure_enum_type(table, parent, column).await?;
                }
                store
                    .apply(&Ddl::AddColumn {
                        table: TableName::from(table),
                        column: ColumnDef::new(column.name.as_str(), sql_type.clone()),
                    })
                    .await?;
                Ok(ColumnState::Created)
            }
        }
    }

    /// Create the column's enum type, or reuse one left behind by an
    /// interrupted run.
    async fn ensure_enum_type(
        &mut self,
        table: &str,
        parent: Option<&str>,
        column: &ColumnSpec,
    ) -> Result<()> {
        let name = enum_type_name(table, &column.name);
        if self.store.type_exists(name.as_str()).await? {
            let target = self.target(table, parent, ObjectKind::EnumType, name.as_str());
            self.report.record(target.outcome(
                Status::Anomalous,
                Some("type exists without its column; reusing it".to_string()),
            ));
            return self.sync_enum_values(table, parent, column).await;
        }

        self.store
            .apply(&Ddl::CreateEnumType {
                name: name.clone(),
                values: column.values.iter().cloned().collect(),
            })
            .await?;
        let target = self.target(table, parent, ObjectKind::EnumType, name.as_str());
        self.report.record(target.outcome(Status::Added, None));
        Ok(())
    }

    /// Append declared values the stored type lacks. Stored values that are
    /// no longer declared stay, and are reported.
    async fn sync_enum_values(
        &mut self,
        table: &str,
        parent: Option<&str>,
        column: &ColumnSpec,
    ) -> Result<()> {
        let name = enum_type_name(table, &column.name);
        let stored = self.store.enum_values(name.as_str()).await?;

        let missing: Vec<&String> = column
            .values
            .iter()
            .filter(|value| !stored.contains(value))
            .collect();
        for value in &missing {
            self.store
                .apply(&Ddl::AddEnumValue {
                    name: name.clone(),
                    value: value.to_string(),
                })
                .await?;
        }

        let extra: Vec<&str> = stored
            .iter()
            .filter(|value| !column.values.contains(*value))
            .map(String::as_str)
            .collect();

        let target = self.target(table, parent, ObjectKind::EnumType, name.as_str());
        let outcome = if !extra.is_empty() {
            target.outcome(
                Status::Mismatch,
                Some(format!("stored values no longer declared: {}", extra.join(", "))),
            )
        } else if !missing.is_empty() {
            let added: Vec<&str> = missing.iter().map(|v| v.as_str()).collect();
            target.outcome(Status::Added, Some(format!("values {}", added.join(", "))))
        } else {
            target.outcome(Status::AlreadyExists, None)
        };
        self.report.record(outcome);
        Ok(())
    }

    /// Drop every unique/check constraint keyed on exactly this column and
    /// recreate the declared ones.
    async fn replace_constraints(&mut self, table: &str, column: &ColumnSpec) -> Result<()> {
        let table_name = TableName::from(table);

        for constraint in self.store.constraints_of(table).await? {
            if !constraint.is_on(&column.name) {
                continue;
            }
            tracing::debug!(table, constraint = %constraint.name, "dropping constraint");
            self.store
                .apply(&Ddl::DropConstraint {
                    table: table_name.clone(),
                    name: ConstraintName::from(constraint.name),
                })
                .await?;
        }

        if column.unique {
            self.store
                .apply(&Ddl::AddConstraint {
                    table: table_name.clone(),
                    name: unique_constraint_name(table, &column.name),
                    kind: ConstraintKind::Unique(ColumnName::from(column.name.as_str())),
                })
                .await?;
        }

        if !column.optional {
            self.store
                .apply(&Ddl::AddConstraint {
                    table: table_name,
                    name: not_null_constraint_name(table, &column.name),
                    kind: ConstraintKind::NotNull(ColumnName::from(column.name.as_str())),
                })
                .await?;
        }

        Ok(())
    }

    /// Add the `{column}_comments` sibling if wanted. An existing one is never
    /// removed.
    async fn reconcile_comments(
        &mut self,
        table: &str,
        parent: Option<&str>,
        column: &ColumnSpec,
    ) -> Result<()> {
        let name = comments_column(&column.name);
        let target = self.target(table, parent, ObjectKind::CommentsColumn, name.as_str());

        let exists = match self.store.column_exists(table, name.as_str()).await {
            Ok(exists) => exists,
            Err(e) => {
                let detail = recover(e)?;
                self.report
                    .record(target.outcome(Status::Failed, Some(detail)));
                return Ok(());
            }
        };

        match (column.comments, exists) {
            (true, false) => {
                let ddl = Ddl::AddColumn {
                    table: TableName::from(table),
                    column: ColumnDef::new(name.clone(), SqlType::Text).default_text(""),
                };
                let result = self.store.apply(&ddl).await.map(|()| Status::Added);
                conclude(self.report, &target, result)?;
            }
            (true, true) => self
                .report
                .record(target.outcome(Status::AlreadyExists, None)),
            (false, true) => self.report.record(target.outcome(
                Status::Mismatch,
                Some("comments are disabled but the column exists; keeping its text".to_string()),
            )),
            (false, false) => {}
        }
        Ok(())
    }
}
