//! Turn a parsed [`Document`] into a validated [`Schema`].
//!
//! Malformed entries are dropped with a [`Diagnostic`]; well-formed siblings
//! are kept. A malformed column or descriptor drops its whole table, since
//! reconciling half a table would leave it in a shape nobody declared.
//!
//! Every name the engine would derive from an entry must fit in
//! [`MAX_IDENTIFIER_LEN`] bytes; Postgres would otherwise truncate it and two
//! long names could collide.
//!
//! Reserved names are *not* checked here. That gate runs in the engine so a
//! violation shows up as a per-object outcome alongside everything else.

use crate::document::{ColumnEntry, DatabaseEntry, DescriptorEntry, Document, TableEntry};
use crate::model::{ColumnSpec, DatabaseSpec, DescriptorSpec, LogicalType, Schema, TableSpec};
use crate::naming::normalize;
use indexmap::IndexSet;
use settle_sql::{
    MAX_IDENTIFIER_LEN, comments_column, descriptor_table, enum_type_name, foreign_key_name,
    not_null_constraint_name, tag_aliases_table, tag_groups_table, tag_names_table, tags_table,
    unique_constraint_name,
};
use std::collections::HashSet;
use std::fmt;

/// Why an entry of the description was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where in the document, e.g. `shop/widgets`.
    pub location: String,
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.location, self.message)
        }
    }
}

/// Validate a document, returning the well-formed part and what was dropped.
pub fn validate(document: &Document) -> (Schema, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let mut seen = HashSet::new();
    let mut databases = Vec::new();

    for entry in &document.data {
        let Some(database) = validate_database(entry, &mut diagnostics) else {
            continue;
        };
        if !seen.insert(database.name.clone()) {
            diagnostics.push(Diagnostic::new(
                &database.name,
                "database is declared more than once; skipping the later declaration.",
            ));
            continue;
        }
        databases.push(database);
    }

    (Schema { databases }, diagnostics)
}

fn non_empty(name: &Option<String>) -> Option<&str> {
    name.as_deref().filter(|n| !n.trim().is_empty())
}

fn validate_database(entry: &DatabaseEntry, diagnostics: &mut Vec<Diagnostic>) -> Option<DatabaseSpec> {
    let Some(raw) = non_empty(&entry.dbname) else {
        diagnostics.push(Diagnostic::new(
            "",
            "Databases must have names under the key \"dbname\". Skipping a nameless database.",
        ));
        return None;
    };
    let name = normalize(raw);
    if name.len() > MAX_IDENTIFIER_LEN {
        diagnostics.push(too_long(&name, &name));
        return None;
    }

    let mut seen = HashSet::new();
    let mut tables = Vec::new();
    for table in &entry.tables {
        let Some(table) = validate_table(&name, table, diagnostics) else {
            continue;
        };
        if !seen.insert(table.name.clone()) {
            diagnostics.push(Diagnostic::new(
                format!("{name}/{}", table.name),
                "table is declared more than once; skipping the later declaration.",
            ));
            continue;
        }
        tables.push(table);
    }

    Some(DatabaseSpec { name, tables })
}

fn validate_table(
    database: &str,
    entry: &TableEntry,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<TableSpec> {
    let Some(raw) = non_empty(&entry.table_name) else {
        diagnostics.push(Diagnostic::new(
            database,
            "Tables must have a non-empty name specified in key \"tableName\". Skipping a nameless table.",
        ));
        return None;
    };
    let name = normalize(raw);
    let location = format!("{database}/{name}");
    let before = diagnostics.len();

    let columns = match entry.schema.as_deref() {
        Some(columns) if !columns.is_empty() => {
            validate_columns(&location, columns, diagnostics)
        }
        _ => {
            diagnostics.push(Diagnostic::new(
                &location,
                "table must have at least 1 column of data to store.",
            ));
            Vec::new()
        }
    };

    let descriptors = match &entry.descriptors {
        None => None,
        Some(descriptors) if descriptors.is_empty() => {
            diagnostics.push(Diagnostic::new(
                &location,
                "table must have at least 1 descriptor if descriptors are enabled.",
            ));
            None
        }
        Some(descriptors) => Some(validate_descriptors(&location, descriptors, diagnostics)),
    };

    let table = TableSpec {
        name,
        columns,
        tagging: entry.tagging.unwrap_or(false),
        descriptors,
    };
    for name in derived_names(&table) {
        if name.len() > MAX_IDENTIFIER_LEN {
            diagnostics.push(too_long(&location, &name));
        }
    }

    if diagnostics.len() > before {
        diagnostics.push(Diagnostic::new(&location, "skipping table."));
        return None;
    }

    Some(table)
}

fn too_long(location: &str, name: &str) -> Diagnostic {
    Diagnostic::new(
        location,
        format!("\"{name}\" is longer than Postgres' {MAX_IDENTIFIER_LEN}-byte limit for names."),
    )
}

/// Every identifier reconciling `table` would create.
fn derived_names(table: &TableSpec) -> Vec<String> {
    let mut names = vec![table.name.clone()];
    column_names(&table.name, &table.columns, &mut names);

    if table.tagging {
        names.extend(
            [
                tag_names_table(&table.name),
                tags_table(&table.name),
                tag_aliases_table(&table.name),
                tag_groups_table(&table.name),
            ]
            .map(|name| name.to_string()),
        );
        names.push(foreign_key_name(&table.name, "primary_tag").to_string());
    }

    for descriptor in table.descriptors.iter().flatten() {
        let sibling = descriptor_table(&table.name, &descriptor.name).to_string();
        column_names(&sibling, &descriptor.columns, &mut names);
        names.push(sibling);
    }

    names
}

fn column_names(table: &str, columns: &[ColumnSpec], names: &mut Vec<String>) {
    for column in columns {
        names.push(column.name.clone());
        if column.datatype == LogicalType::Enum {
            names.push(enum_type_name(table, &column.name).to_string());
        }
        if column.unique {
            names.push(unique_constraint_name(table, &column.name).to_string());
        }
        if !column.optional {
            names.push(not_null_constraint_name(table, &column.name).to_string());
        }
        if column.comments {
            names.push(comments_column(&column.name).to_string());
        }
    }
}

fn validate_descriptors(
    location: &str,
    entries: &[DescriptorEntry],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<DescriptorSpec> {
    let mut seen = HashSet::new();
    let mut descriptors = Vec::new();

    for entry in entries {
        let Some(raw) = non_empty(&entry.name) else {
            diagnostics.push(Diagnostic::new(location, "table contains a nameless descriptor."));
            continue;
        };
        let name = normalize(raw);
        let descriptor_location = format!("{location}/descriptor {name}");

        if !seen.insert(name.clone()) {
            diagnostics.push(Diagnostic::new(
                &descriptor_location,
                "descriptor is declared more than once.",
            ));
            continue;
        }

        let columns = match entry.schema.as_deref() {
            Some(columns) if !columns.is_empty() => {
                validate_columns(&descriptor_location, columns, diagnostics)
            }
            _ => {
                diagnostics.push(Diagnostic::new(
                    &descriptor_location,
                    "descriptor must have a schema that consists of an array of column schemas.",
                ));
                continue;
            }
        };

        descriptors.push(DescriptorSpec { name, columns });
    }

    descriptors
}

fn validate_columns(
    location: &str,
    entries: &[ColumnEntry],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ColumnSpec> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();

    for entry in entries {
        let Some(column) = validate_column(location, entry, diagnostics) else {
            continue;
        };
        if !seen.insert(column.name.clone()) {
            diagnostics.push(Diagnostic::new(
                format!("{location}.{}", column.name),
                "column is declared more than once.",
            ));
            continue;
        }
        columns.push(column);
    }

    columns
}

fn validate_column(
    location: &str,
    entry: &ColumnEntry,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<ColumnSpec> {
    let Some(raw) = non_empty(&entry.name) else {
        diagnostics.push(Diagnostic::new(location, "column is missing a \"name\"."));
        return None;
    };
    let name = normalize(raw);
    let location = format!("{location}.{name}");

    let Some(raw_type) = entry.datatype.as_deref() else {
        diagnostics.push(Diagnostic::new(&location, "column is missing a \"datatype\"."));
        return None;
    };
    let Some(datatype) = LogicalType::parse(raw_type) else {
        diagnostics.push(Diagnostic::new(
            &location,
            format!("\"{raw_type}\" is not a known datatype."),
        ));
        return None;
    };

    let values: IndexSet<String> = entry.values.iter().flatten().cloned().collect();
    match (datatype, values.is_empty()) {
        (LogicalType::Enum, true) => {
            diagnostics.push(Diagnostic::new(
                &location,
                "enum columns must list their \"values\".",
            ));
            return None;
        }
        (LogicalType::Enum, false) => {
            if let Some(value) = values.iter().find(|v| v.len() > MAX_IDENTIFIER_LEN) {
                diagnostics.push(Diagnostic::new(
                    &location,
                    format!("enum value \"{value}\" is longer than {MAX_IDENTIFIER_LEN} bytes."),
                ));
                return None;
            }
        }
        (_, false) => {
            diagnostics.push(Diagnostic::new(
                &location,
                format!("\"values\" only applies to enum columns, not {datatype}."),
            ));
            return None;
        }
        (_, true) => {}
    }

    Some(ColumnSpec {
        name,
        datatype,
        values,
        optional: entry.optional.unwrap_or(true),
        unique: entry.unique.unwrap_or(false),
        comments: entry.comments.unwrap_or(false),
    })
}
