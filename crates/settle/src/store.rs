//! The seams between the engine and a live store.
//!
//! [`Inspector`] answers read-only questions about one database, [`Executor`]
//! applies DDL to it, and [`Server`] is the cluster-level handle that creates
//! databases and opens stores on them. The Postgres implementation lives in
//! [`crate::postgres`].

use crate::Result;
use crate::outcome::Outcome;
use chrono::{DateTime, Utc};
use settle_sql::{DatabaseName, Ddl};

/// A constraint as the catalog reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintType,
    /// Key columns, in key order.
    pub columns: Vec<String>,
}

impl Constraint {
    /// Whether this constraint is keyed on exactly `column`.
    pub fn is_on(&self, column: &str) -> bool {
        self.columns.len() == 1 && self.columns[0] == column
    }
}

/// Constraint types that [`Inspector::constraints_of`] can return.
///
/// Primary and foreign keys never show up there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    Unique,
    Check,
    Exclusion,
}

impl ConstraintType {
    /// Map a `pg_constraint.contype` code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "u" => Some(ConstraintType::Unique),
            "c" => Some(ConstraintType::Check),
            "x" => Some(ConstraintType::Exclusion),
            _ => None,
        }
    }
}

/// Read-only lookups against one database. None of these create anything.
#[allow(async_fn_in_trait)]
pub trait Inspector {
    async fn table_exists(&self, table: &str) -> Result<bool>;

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool>;

    /// The stored type, spelled the way [`settle_sql::SqlType::catalog_name`]
    /// spells it. `None` if the column doesn't exist.
    async fn column_type(&self, table: &str, column: &str) -> Result<Option<String>>;

    /// Constraints on `table`, primary and foreign keys excluded.
    async fn constraints_of(&self, table: &str) -> Result<Vec<Constraint>>;

    /// Whether `table` has a constraint called `name`, of any type.
    async fn constraint_exists(&self, table: &str, name: &str) -> Result<bool>;

    async fn type_exists(&self, name: &str) -> Result<bool>;

    /// Labels of an enum type, in sort order.
    async fn enum_values(&self, name: &str) -> Result<Vec<String>>;
}

/// Applies DDL to one database.
#[allow(async_fn_in_trait)]
pub trait Executor {
    async fn apply(&self, ddl: &Ddl) -> Result<()>;
}

/// Appends outcome rows to a ledger table.
#[allow(async_fn_in_trait)]
pub trait AuditSink {
    async fn append(&self, table: &str, outcome: &Outcome, at: DateTime<Utc>) -> Result<()>;
}

/// Everything the engine needs from one open database.
pub trait Store: Inspector + Executor + AuditSink {}

impl<T: Inspector + Executor + AuditSink> Store for T {}

/// A cluster: creates databases and opens stores on them.
#[allow(async_fn_in_trait)]
pub trait Server {
    type Store: Store;

    async fn database_exists(&self, name: &str) -> Result<bool>;

    async fn create_database(&self, name: &DatabaseName) -> Result<()>;

    async fn open(&self, database: &str) -> Result<Self::Store>;
}
