//! Reserved columns: `id` and `primary_tag`.
//!
//! A missing `id` is reported and never repaired; adding a primary key to a
//! populated table is not something to do unattended.

use super::{Session, recover};
use crate::Result;
use crate::outcome::{ObjectKind, Status};
use crate::store::Store;
use settle_schema::TableSpec;
use settle_sql::{
    ColumnDef, ColumnName, ConstraintKind, Ddl, Reference, SqlType, TableName, foreign_key_name,
    tag_names_table,
};

const ID: &str = "id";
const PRIMARY_TAG: &str = "primary_tag";

enum PrimaryTag {
    /// Column and foreign key are both there.
    Present,
    Added,
    /// The column was there without its foreign key.
    KeyRestored,
    NoTagNames,
}

impl<St: Store> Session<'_, St> {
    pub(crate) async fn reconcile_reserved(&mut self, table: &TableSpec) -> Result<()> {
        let name = table.name.as_str();

        let id = self.target(name, None, ObjectKind::ReservedColumn, ID);
        match self.store.column_exists(name, ID).await {
            Ok(true) => self.report.record(id.outcome(Status::AlreadyExists, None)),
            Ok(false) => {
                self.report.record(id.outcome(
                    Status::Failed,
                    Some("the id primary key is missing and will not be added".to_string()),
                ));
                return Ok(());
            }
            Err(e) => {
                let detail = recover(e)?;
                self.report.record(id.outcome(Status::Failed, Some(detail)));
                return Ok(());
            }
        }

        let primary_tag = self.target(name, None, ObjectKind::ReservedColumn, PRIMARY_TAG);
        let exists = match self.store.column_exists(name, PRIMARY_TAG).await {
            Ok(exists) => exists,
            Err(e) => {
                let detail = recover(e)?;
                self.report
                    .record(primary_tag.outcome(Status::Failed, Some(detail)));
                return Ok(());
            }
        };

        match (table.tagging, exists) {
            (true, _) => {
                let outcome = match self.ensure_primary_tag(name, exists).await {
                    Ok(PrimaryTag::Present) => primary_tag.outcome(Status::AlreadyExists, None),
                    Ok(PrimaryTag::Added) => primary_tag.outcome(Status::Added, None),
                    Ok(PrimaryTag::KeyRestored) => primary_tag.outcome(
                        Status::Added,
                        Some(format!(
                            "{} was missing; added it",
                            foreign_key_name(name, PRIMARY_TAG)
                        )),
                    ),
                    Ok(PrimaryTag::NoTagNames) => primary_tag.outcome(
                        Status::Failed,
                        Some(format!(
                            "{} is missing, so primary_tag has nothing to reference",
                            tag_names_table(name)
                        )),
                    ),
                    Err(e) => primary_tag.outcome(Status::Failed, Some(recover(e)?)),
                };
                self.report.record(outcome);
            }
            (false, true) => self.report.record(primary_tag.outcome(
                Status::Failed,
                Some("primary_tag exists but tagging is disabled".to_string()),
            )),
            (false, false) => {}
        }
        Ok(())
    }

    /// Make sure `primary_tag` exists together with its foreign key to
    /// `{table}_tag_names`. Neither is added while that table is missing.
    async fn ensure_primary_tag(&mut self, table: &str, exists: bool) -> Result<PrimaryTag> {
        let fkey = foreign_key_name(table, PRIMARY_TAG);
        if exists && self.store.constraint_exists(table, fkey.as_str()).await? {
            return Ok(PrimaryTag::Present);
        }

        let tag_names = tag_names_table(table);
        if !self.store.table_exists(tag_names.as_str()).await? {
            return Ok(PrimaryTag::NoTagNames);
        }

        let table_name = TableName::from(table);
        if !exists {
            self.store
                .apply(&Ddl::AddColumn {
                    table: table_name.clone(),
                    column: ColumnDef::new(PRIMARY_TAG, SqlType::Integer),
                })
                .await?;
        }
        self.store
            .apply(&Ddl::AddConstraint {
                table: table_name,
                name: fkey,
                kind: ConstraintKind::ForeignKey {
                    column: ColumnName::from(PRIMARY_TAG),
                    references: Reference {
                        table: tag_names,
                        column: ColumnName::from(ID),
                    },
                },
            })
            .await?;

        Ok(if exists {
            PrimaryTag::KeyRestored
        } else {
            PrimaryTag::Added
        })
    }
}
