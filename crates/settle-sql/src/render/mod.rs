//! Render the DDL AST to SQL text.

use std::fmt;

use crate::ddl::*;
use crate::{Ident, Lit};

/// Render a statement to a single SQL string, terminated by `;`.
pub fn render(ddl: &Ddl) -> String {
    ddl.to_string()
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Serial => write!(f, "SERIAL"),
            SqlType::Integer => write!(f, "INTEGER"),
            SqlType::Real => write!(f, "REAL"),
            SqlType::DoublePrecision => write!(f, "DOUBLE PRECISION"),
            SqlType::Text => write!(f, "TEXT"),
            SqlType::Boolean => write!(f, "BOOLEAN"),
            SqlType::Date => write!(f, "DATE"),
            SqlType::Time => write!(f, "TIME"),
            SqlType::Timestamp => write!(f, "TIMESTAMP"),
            SqlType::Timestamptz => write!(f, "TIMESTAMPTZ"),
            SqlType::Interval => write!(f, "INTERVAL"),
            SqlType::Named(name) => write!(f, "{}", Ident(name.as_str())),
        }
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", Ident(self.name.as_str()), self.ty)?;
        if self.primary_key {
            write!(f, " PRIMARY KEY")?;
        }
        if let Some(reference) = &self.references {
            write!(
                f,
                " REFERENCES {} ({})",
                Ident(reference.table.as_str()),
                Ident(reference.column.as_str())
            )?;
        }
        if self.not_null && !self.primary_key {
            write!(f, " NOT NULL")?;
        }
        if self.unique && !self.primary_key {
            write!(f, " UNIQUE")?;
        }
        if let Some(default) = &self.default {
            write!(f, " DEFAULT {}", Lit(default))?;
        }
        Ok(())
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::Unique(column) => write!(f, "UNIQUE ({})", Ident(column.as_str())),
            ConstraintKind::NotNull(column) => {
                write!(f, "CHECK ({} IS NOT NULL)", Ident(column.as_str()))
            }
            ConstraintKind::ForeignKey { column, references } => write!(
                f,
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                Ident(column.as_str()),
                Ident(references.table.as_str()),
                Ident(references.column.as_str())
            ),
        }
    }
}

impl fmt::Display for CreateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CREATE TABLE IF NOT EXISTS {} (", Ident(self.name.as_str()))?;
        for (i, column) in self.columns.iter().enumerate() {
            let sep = if i + 1 < self.columns.len() { "," } else { "" };
            writeln!(f, "    {}{}", column, sep)?;
        }
        write!(f, ");")
    }
}

impl fmt::Display for Ddl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ddl::CreateDatabase(name) => write!(f, "CREATE DATABASE {};", Ident(name.as_str())),
            Ddl::CreateTable(table) => write!(f, "{}", table),
            Ddl::CreateEnumType { name, values } => {
                write!(f, "CREATE TYPE {} AS ENUM (", Ident(name.as_str()))?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", Lit(value))?;
                }
                write!(f, ");")
            }
            Ddl::AddEnumValue { name, value } => write!(
                f,
                "ALTER TYPE {} ADD VALUE IF NOT EXISTS {};",
                Ident(name.as_str()),
                Lit(value)
            ),
            Ddl::AddColumn { table, column } => write!(
                f,
                "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {};",
                Ident(table.as_str()),
                column
            ),
            Ddl::AddConstraint { table, name, kind } => write!(
                f,
                "ALTER TABLE {} ADD CONSTRAINT {} {};",
                Ident(table.as_str()),
                Ident(name.as_str()),
                kind
            ),
            Ddl::DropConstraint { table, name } => write!(
                f,
                "ALTER TABLE {} DROP CONSTRAINT IF EXISTS {};",
                Ident(table.as_str()),
                Ident(name.as_str())
            ),
        }
    }
}
