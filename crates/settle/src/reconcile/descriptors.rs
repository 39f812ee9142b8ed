//! Descriptor tables: `{table}_{descriptor}_descriptors`, each reconciled
//! with its own column list.
//!
//! Nothing ties a descriptor row to a parent row; the tables are related by
//! name only.

use super::Session;
use crate::Result;
use crate::outcome::ObjectKind;
use crate::store::Store;
use settle_schema::DescriptorSpec;
use settle_schema::naming::{self, NameClass};
use settle_sql::{CreateTable, descriptor_table};

impl<St: Store> Session<'_, St> {
    pub(crate) async fn reconcile_descriptor(
        &mut self,
        table: &str,
        descriptor: &DescriptorSpec,
    ) -> Result<()> {
        let violations = naming::check(NameClass::Descriptor, &descriptor.name);
        if !violations.is_empty() {
            self.report.skip(
                format!("{}/{table}/descriptor {}", self.database, descriptor.name),
                violations,
            );
            return Ok(());
        }

        let name = descriptor_table(table, &descriptor.name);
        let create = CreateTable::with_id(name.clone());
        if !self
            .ensure_table(create, ObjectKind::Descriptor, Some(table))
            .await?
        {
            return Ok(());
        }

        self.reconcile_columns(name.as_str(), Some(table), &descriptor.columns)
            .await
    }
}
