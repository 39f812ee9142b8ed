//! The tagging bundle: four sibling tables per tagging-enabled table.
//!
//! `{table}_tag_names` goes first; `{table}_tags`, `{table}_tag_aliases`
//! and `{table}_tag_groups` all reference it. Each table is checked on its
//! own, so a half-created bundle gets completed.

use super::Session;
use crate::Result;
use crate::outcome::{ObjectKind, Status};
use crate::store::Store;
use settle_sql::{
    ColumnDef, CreateTable, SqlType, TableName, tag_aliases_table, tag_groups_table,
    tag_names_table, tags_table,
};

/// `tag_id INTEGER REFERENCES {tag_names} ("id") NOT NULL`
fn tag_id(tag_names: &TableName) -> ColumnDef {
    ColumnDef::new("tag_id", SqlType::Integer)
        .references(tag_names.clone(), "id")
        .not_null()
}

/// The bundle's tables in creation order, `tag_names` first.
pub(crate) fn bundle(table: &str) -> [(ObjectKind, CreateTable); 4] {
    let tag_names = tag_names_table(table);
    [
        (
            ObjectKind::TagNames,
            CreateTable::with_id(tag_names.clone()).column(
                ColumnDef::new("tag_name", SqlType::Text)
                    .not_null()
                    .unique(),
            ),
        ),
        (
            ObjectKind::Tags,
            CreateTable::with_id(tags_table(table))
                .column(
                    ColumnDef::new("entry_id", SqlType::Integer)
                        .references(TableName::from(table), "id")
                        .not_null(),
                )
                .column(tag_id(&tag_names)),
        ),
        (
            ObjectKind::TagAliases,
            CreateTable::new(tag_aliases_table(table))
                .column(ColumnDef::new("alias", SqlType::Text).primary_key())
                .column(tag_id(&tag_names)),
        ),
        (
            ObjectKind::TagGroups,
            CreateTable::with_id(tag_groups_table(table))
                .column(tag_id(&tag_names))
                .column(ColumnDef::new("group_name", SqlType::Text).not_null()),
        ),
    ]
}

impl<St: Store> Session<'_, St> {
    pub(crate) async fn ensure_tagging(&mut self, table: &str) -> Result<()> {
        let [tag_names, rest @ ..] = bundle(table);

        let (kind, create) = tag_names;
        let names = create.name.to_string();
        if !self.ensure_table(create, kind, Some(table)).await? {
            // the rest all reference it
            for (kind, create) in rest {
                let name = create.name.to_string();
                let detail = format!("{names} could not be created");
                let target = self.target(&name, Some(table), kind, &name);
                self.report
                    .record(target.outcome(Status::Failed, Some(detail)));
            }
            return Ok(());
        }

        for (kind, create) in rest {
            self.ensure_table(create, kind, Some(table)).await?;
        }
        Ok(())
    }
}
