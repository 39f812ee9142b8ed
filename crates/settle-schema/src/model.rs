//! The declarative schema model.
//!
//! Values here are already validated and normalised: every name is
//! lower_snake_case, every table has at least one column, every enum column
//! has values. Build them with [`crate::load`] or the builder methods below.

use indexmap::IndexSet;
use settle_sql::{SqlType, enum_type_name};
use std::fmt;

/// A whole schema description: one entry per target database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub databases: Vec<DatabaseSpec>,
}

/// A database and the tables declared in it.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSpec {
    pub name: String,
    pub tables: Vec<TableSpec>,
}

impl DatabaseSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    pub fn table(mut self, table: TableSpec) -> Self {
        self.tables.push(table);
        self
    }
}

/// A declared table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    /// Whether the tagging bundle (four sibling tables) is wanted.
    pub tagging: bool,
    /// Descriptor sibling tables. `None` when the table declares none;
    /// never `Some(empty)`.
    pub descriptors: Option<Vec<DescriptorSpec>>,
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            tagging: false,
            descriptors: None,
        }
    }

    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    pub fn tagging(mut self, tagging: bool) -> Self {
        self.tagging = tagging;
        self
    }

    pub fn descriptor(mut self, descriptor: DescriptorSpec) -> Self {
        self.descriptors.get_or_insert_with(Vec::new).push(descriptor);
        self
    }
}

/// A declared column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub datatype: LogicalType,
    /// Enum values, in declaration order. Non-empty iff `datatype` is `Enum`.
    pub values: IndexSet<String>,
    /// Nullable unless false.
    pub optional: bool,
    pub unique: bool,
    /// Requests a `{name}_comments` free-text sibling column.
    pub comments: bool,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, datatype: LogicalType) -> Self {
        Self {
            name: name.into(),
            datatype,
            values: IndexSet::new(),
            optional: true,
            unique: false,
            comments: false,
        }
    }

    /// An enum column with the given values.
    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut column = Self::new(name, LogicalType::Enum);
        column.values = values.into_iter().map(Into::into).collect();
        column
    }

    /// Marks the column NOT NULL.
    pub fn required(mut self) -> Self {
        self.optional = false;
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn comments(mut self, comments: bool) -> Self {
        self.comments = comments;
        self
    }

    /// The Postgres type this column is stored as inside `table`.
    pub fn sql_type(&self, table: &str) -> SqlType {
        self.datatype.sql_type(table, &self.name)
    }
}

/// A descriptor: an independently-schema'd attribute group stored in
/// `{table}_{descriptor}_descriptors`.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
}

impl DescriptorSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }
}

/// The logical column types a description may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    Int,
    Float,
    Double,
    Text,
    Bool,
    Date,
    Time,
    Timestamp,
    /// Only the audit ledger uses this; descriptions can't declare it.
    Timestamptz,
    Interval,
    Enum,
}

impl LogicalType {
    /// Parse a datatype as written in a description, aliases included.
    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "int" | "integer" => LogicalType::Int,
            "float" | "number" => LogicalType::Float,
            "double" => LogicalType::Double,
            "str" | "string" | "text" => LogicalType::Text,
            "bool" | "boolean" => LogicalType::Bool,
            "date" => LogicalType::Date,
            "time" => LogicalType::Time,
            "timestamp" => LogicalType::Timestamp,
            "interval" => LogicalType::Interval,
            "enum" => LogicalType::Enum,
            _ => return None,
        })
    }

    /// The Postgres type for a column of this type in `table`.
    ///
    /// Enums map to the table-scoped `{table}_{column}_enum` type.
    pub fn sql_type(self, table: &str, column: &str) -> SqlType {
        match self {
            LogicalType::Int => SqlType::Integer,
            LogicalType::Float => SqlType::Real,
            LogicalType::Double => SqlType::DoublePrecision,
            LogicalType::Text => SqlType::Text,
            LogicalType::Bool => SqlType::Boolean,
            LogicalType::Date => SqlType::Date,
            LogicalType::Time => SqlType::Time,
            LogicalType::Timestamp => SqlType::Timestamp,
            LogicalType::Timestamptz => SqlType::Timestamptz,
            LogicalType::Interval => SqlType::Interval,
            LogicalType::Enum => SqlType::Named(enum_type_name(table, column)),
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogicalType::Int => "int",
            LogicalType::Float => "float",
            LogicalType::Double => "double",
            LogicalType::Text => "string",
            LogicalType::Bool => "bool",
            LogicalType::Date => "date",
            LogicalType::Time => "time",
            LogicalType::Timestamp => "timestamp",
            LogicalType::Timestamptz => "timestamptz",
            LogicalType::Interval => "interval",
            LogicalType::Enum => "enum",
        };
        write!(f, "{name}")
    }
}
