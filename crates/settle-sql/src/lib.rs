//! DDL AST and rendering.
//!
//! Every identifier that reaches SQL text goes through [`Ident`], every string
//! value through [`Lit`]. Nothing in this crate interpolates a raw name.

use strid::braid;

mod ddl;
pub use ddl::*;

mod render;
pub use render::*;

/// The name of a database.
#[braid]
pub struct DatabaseName;

/// The name of a table.
#[braid]
pub struct TableName;

/// The name of a column.
#[braid]
pub struct ColumnName;

/// The name of a user-defined type (enums).
#[braid]
pub struct TypeName;

/// The name of a table constraint.
#[braid]
pub struct ConstraintName;

/// A PostgreSQL string literal wrapper.
///
/// Display writes the value escaped and quoted with single quotes.
///
/// # Example
/// ```
/// use settle_sql::Lit;
/// assert_eq!(format!("{}", Lit("foo")), "'foo'");
/// assert_eq!(format!("{}", Lit("it's")), "'it''s'");
/// ```
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'")?;
        for c in self.0.as_ref().chars() {
            if c == '\'' {
                write!(f, "''")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "'")
    }
}

/// A PostgreSQL identifier wrapper.
///
/// Display writes the value escaped and quoted with double quotes.
///
/// # Example
/// ```
/// use settle_sql::Ident;
/// assert_eq!(format!("{}", Ident("user")), "\"user\"");
/// assert_eq!(format!("{}", Ident("bla\"h")), "\"bla\"\"h\"");
/// ```
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"")?;
        for c in self.0.as_ref().chars() {
            if c == '"' {
                write!(f, "\"\"")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "\"")
    }
}

/// Escape a string literal for SQL.
pub fn escape_string(s: &str) -> String {
    format!("{}", Lit(s))
}

/// Quote a PostgreSQL identifier.
///
/// Always quotes, so reserved words like `user` or `order` are safe as
/// table and column names. Doubles any embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("{}", Ident(name))
}

/// The longest identifier Postgres keeps, in bytes (`NAMEDATALEN - 1`).
/// Longer names are silently truncated.
pub const MAX_IDENTIFIER_LEN: usize = 63;

// Generated sibling-object names. These patterns are part of the on-disk
// contract: changing one orphans every object created under the old name.

/// `{table}_tag_names`
pub fn tag_names_table(table: &str) -> TableName {
    TableName::new(format!("{table}_tag_names"))
}

/// `{table}_tags`
pub fn tags_table(table: &str) -> TableName {
    TableName::new(format!("{table}_tags"))
}

/// `{table}_tag_aliases`
pub fn tag_aliases_table(table: &str) -> TableName {
    TableName::new(format!("{table}_tag_aliases"))
}

/// `{table}_tag_groups`
pub fn tag_groups_table(table: &str) -> TableName {
    TableName::new(format!("{table}_tag_groups"))
}

/// `{table}_{descriptor}_descriptors`
pub fn descriptor_table(table: &str, descriptor: &str) -> TableName {
    TableName::new(format!("{table}_{descriptor}_descriptors"))
}

/// `{table}_{column}_enum`, the enum type backing an enum column.
///
/// Scoped by table so two tables declaring an enum column of the same name
/// get independent types.
pub fn enum_type_name(table: &str, column: &str) -> TypeName {
    TypeName::new(format!("{table}_{column}_enum"))
}

/// `{table}_{column}_unique`
pub fn unique_constraint_name(table: &str, column: &str) -> ConstraintName {
    ConstraintName::new(format!("{table}_{column}_unique"))
}

/// `{table}_{column}_not_null`
pub fn not_null_constraint_name(table: &str, column: &str) -> ConstraintName {
    ConstraintName::new(format!("{table}_{column}_not_null"))
}

/// `{table}_{column}_fkey`
pub fn foreign_key_name(table: &str, column: &str) -> ConstraintName {
    ConstraintName::new(format!("{table}_{column}_fkey"))
}

/// `{column}_comments`, the free-text sibling of a column.
pub fn comments_column(column: &str) -> ColumnName {
    ColumnName::new(format!("{column}_comments"))
}
