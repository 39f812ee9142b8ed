//! Facet types for the schema description document.
//!
//! These mirror the document as written, so every field is optional: a
//! missing name or column list is a per-entry diagnostic raised in
//! [`crate::validate`], not a parse failure for the whole file.
//!
//! The file is first read as [`RawDocument`], with each database and table
//! entry left as an untyped [`Value`]. Entries are then shaped one at a time,
//! so a table whose `schema` is a string instead of a list only loses that
//! table.
//!
//! ```text
//! data: [
//!   {
//!     dbname: "shop",
//!     tables: [
//!       {
//!         tableName: "Widgets",
//!         tagging: true,
//!         schema: [{ name: "sku", datatype: "string", unique: true }],
//!         descriptors: [{ name: "size", schema: [{ name: "width", datatype: "float" }] }]
//!       }
//!     ]
//!   }
//! ]
//! ```

use crate::naming::normalize;
use crate::validate::Diagnostic;
use facet::Facet;
use facet_value::Value;

/// The top-level description document.
#[derive(Debug, Clone, Default, Facet)]
pub struct Document {
    /// One entry per target database.
    #[facet(default)]
    pub data: Vec<DatabaseEntry>,
}

/// A database entry.
#[derive(Debug, Clone, Default, Facet)]
pub struct DatabaseEntry {
    #[facet(default)]
    pub dbname: Option<String>,

    #[facet(default)]
    pub tables: Vec<TableEntry>,
}

/// A table entry.
#[derive(Debug, Clone, Default, Facet)]
pub struct TableEntry {
    #[facet(default, rename = "tableName")]
    pub table_name: Option<String>,

    /// The table's columns.
    #[facet(default)]
    pub schema: Option<Vec<ColumnEntry>>,

    #[facet(default)]
    pub tagging: Option<bool>,

    #[facet(default)]
    pub descriptors: Option<Vec<DescriptorEntry>>,
}

/// A column entry.
#[derive(Debug, Clone, Default, Facet)]
pub struct ColumnEntry {
    #[facet(default)]
    pub name: Option<String>,

    #[facet(default)]
    pub datatype: Option<String>,

    /// Required iff `datatype` is `enum`.
    #[facet(default)]
    pub values: Option<Vec<String>>,

    /// Defaults to true.
    #[facet(default)]
    pub optional: Option<bool>,

    #[facet(default)]
    pub unique: Option<bool>,

    #[facet(default)]
    pub comments: Option<bool>,
}

/// A descriptor entry.
#[derive(Debug, Clone, Default, Facet)]
pub struct DescriptorEntry {
    #[facet(default)]
    pub name: Option<String>,

    #[facet(default)]
    pub schema: Option<Vec<ColumnEntry>>,
}

/// The document as read from disk, before entries are given their shape.
#[derive(Debug, Default, Facet)]
pub(crate) struct RawDocument {
    #[facet(default)]
    pub data: Vec<Value>,
}

#[derive(Debug, Facet)]
struct RawDatabase {
    #[facet(default)]
    dbname: Option<String>,

    #[facet(default)]
    tables: Vec<Value>,
}

/// Just the name keys, to place a diagnostic for an entry that won't shape.
#[derive(Debug, Default, Facet)]
struct EntryNames {
    #[facet(default)]
    dbname: Option<String>,

    #[facet(default, rename = "tableName")]
    table_name: Option<String>,
}

impl EntryNames {
    fn of(value: &Value) -> Self {
        facet_value::from_value(value.clone()).unwrap_or_default()
    }
}

impl RawDocument {
    /// Shape every entry, dropping the ones that don't fit with a diagnostic.
    pub(crate) fn shape(self) -> (Document, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let mut data = Vec::new();

        for entry in self.data {
            let names = EntryNames::of(&entry);
            let location = names.dbname.as_deref().map(normalize).unwrap_or_default();

            let database: RawDatabase = match facet_value::from_value(entry) {
                Ok(database) => database,
                Err(e) => {
                    diagnostics.push(Diagnostic::new(
                        &location,
                        format!("database entry has the wrong shape ({e}). Skipping it."),
                    ));
                    continue;
                }
            };

            let mut tables = Vec::new();
            for table in database.tables {
                let names = EntryNames::of(&table);
                match facet_value::from_value::<TableEntry>(table) {
                    Ok(table) => tables.push(table),
                    Err(e) => {
                        let location = match names.table_name.as_deref() {
                            Some(name) => format!("{location}/{}", normalize(name)),
                            None => location.clone(),
                        };
                        diagnostics.push(Diagnostic::new(
                            location,
                            format!("table entry has the wrong shape ({e}). Skipping table."),
                        ));
                    }
                }
            }

            data.push(DatabaseEntry {
                dbname: database.dbname,
                tables,
            });
        }

        (Document { data }, diagnostics)
    }
}
