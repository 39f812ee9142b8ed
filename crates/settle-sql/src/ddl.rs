//! DDL statements.
//!
//! Only additive statements exist here, plus dropping a named constraint.
//! There is deliberately no way to express dropping a table, a column or a type.

use crate::{ColumnName, ConstraintName, DatabaseName, TableName, TypeName};

/// A DDL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Ddl {
    CreateDatabase(DatabaseName),
    CreateTable(CreateTable),
    CreateEnumType {
        name: TypeName,
        values: Vec<String>,
    },
    /// `ALTER TYPE .. ADD VALUE IF NOT EXISTS ..`
    AddEnumValue {
        name: TypeName,
        value: String,
    },
    AddColumn {
        table: TableName,
        column: ColumnDef,
    },
    AddConstraint {
        table: TableName,
        name: ConstraintName,
        kind: ConstraintKind,
    },
    DropConstraint {
        table: TableName,
        name: ConstraintName,
    },
}

/// A CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name: TableName,
    pub columns: Vec<ColumnDef>,
}

impl CreateTable {
    pub fn new(name: TableName) -> Self {
        Self {
            name,
            columns: Vec::new(),
        }
    }

    /// A table carrying only the mandatory `id SERIAL PRIMARY KEY`.
    pub fn with_id(name: TableName) -> Self {
        Self::new(name).column(ColumnDef::serial_id())
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }
}

/// A column definition, inline in CREATE TABLE or in ADD COLUMN.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: ColumnName,
    pub ty: SqlType,
    pub primary_key: bool,
    pub not_null: bool,
    pub unique: bool,
    /// Default value, rendered as a string literal.
    pub default: Option<String>,
    pub references: Option<Reference>,
}

impl ColumnDef {
    pub fn new(name: impl Into<ColumnName>, ty: SqlType) -> Self {
        Self {
            name: name.into(),
            ty,
            primary_key: false,
            not_null: false,
            unique: false,
            default: None,
            references: None,
        }
    }

    /// `id SERIAL PRIMARY KEY`
    pub fn serial_id() -> Self {
        Self::new("id", SqlType::Serial).primary_key()
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_text(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn references(mut self, table: TableName, column: impl Into<ColumnName>) -> Self {
        self.references = Some(Reference {
            table,
            column: column.into(),
        });
        self
    }
}

/// A foreign key target.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub table: TableName,
    pub column: ColumnName,
}

/// A named table constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    Unique(ColumnName),
    /// Materialised as `CHECK (col IS NOT NULL)` so it can be dropped by name.
    NotNull(ColumnName),
    ForeignKey {
        column: ColumnName,
        references: Reference,
    },
}

impl ConstraintKind {
    /// The single column this constraint is keyed on.
    pub fn column(&self) -> &ColumnName {
        match self {
            ConstraintKind::Unique(column) | ConstraintKind::NotNull(column) => column,
            ConstraintKind::ForeignKey { column, .. } => column,
        }
    }
}

/// Postgres column types the engine emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlType {
    /// SERIAL (INTEGER + sequence)
    Serial,
    /// INTEGER
    Integer,
    /// REAL
    Real,
    /// DOUBLE PRECISION
    DoublePrecision,
    /// TEXT
    Text,
    /// BOOLEAN
    Boolean,
    /// DATE
    Date,
    /// TIME
    Time,
    /// TIMESTAMP
    Timestamp,
    /// TIMESTAMPTZ
    Timestamptz,
    /// INTERVAL
    Interval,
    /// A user-defined type, referenced by name.
    Named(TypeName),
}

impl SqlType {
    /// How `information_schema.columns.data_type` spells this type.
    ///
    /// Named types report `USER-DEFINED` there; callers compare the udt name
    /// instead, which is what this returns for them.
    pub fn catalog_name(&self) -> &str {
        match self {
            SqlType::Serial | SqlType::Integer => "integer",
            SqlType::Real => "real",
            SqlType::DoublePrecision => "double precision",
            SqlType::Text => "text",
            SqlType::Boolean => "boolean",
            SqlType::Date => "date",
            SqlType::Time => "time without time zone",
            SqlType::Timestamp => "timestamp without time zone",
            SqlType::Timestamptz => "timestamp with time zone",
            SqlType::Interval => "interval",
            SqlType::Named(name) => name.as_str(),
        }
    }
}
