//! An in-memory cluster that interprets the DDL AST.
//!
//! It enforces what Postgres would for the statements the engine emits:
//! duplicate types and constraints, dangling references and unknown types are
//! rejected, and the `IF [NOT] EXISTS` forms are no-ops where they apply.
//! Tests can also reject chosen statements and cut the connection after a
//! number of calls.

use crate::outcome::Outcome;
use crate::store::{AuditSink, Constraint, ConstraintType, Executor, Inspector, Server};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use settle_sql::{ColumnDef, ConstraintKind, CreateTable, DatabaseName, Ddl, SqlType};
use std::sync::{Arc, Mutex, MutexGuard};

type Reject = Box<dyn Fn(&Ddl) -> bool + Send>;

#[derive(Default)]
struct Cluster {
    databases: IndexMap<String, Database>,
    /// Every statement applied through a store, with its database.
    log: Vec<(String, Ddl)>,
    reject: Option<Reject>,
    /// Calls left before the connection drops.
    budget: Option<usize>,
    /// Calls left on one database's own connection before it drops.
    database_budget: Option<(String, usize)>,
}

#[derive(Default)]
struct Database {
    tables: IndexMap<String, Table>,
    types: IndexMap<String, Vec<String>>,
    rows: Vec<(String, Outcome)>,
}

#[derive(Default)]
struct Table {
    /// Column name to catalog type name.
    columns: IndexMap<String, String>,
    constraints: IndexMap<String, Keyed>,
}

/// A constraint, with the column it is keyed on where it can be dropped.
#[derive(Debug, Clone)]
enum Keyed {
    PrimaryKey,
    Unique(String),
    Check(String),
    ForeignKey,
}

fn rejected(message: impl Into<String>) -> Error {
    Error::Rejected(message.into())
}

impl Cluster {
    fn tick(&mut self) -> Result<()> {
        match &mut self.budget {
            Some(0) => Err(Error::Disconnected("connection closed".into())),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn tick_on(&mut self, database: &str) -> Result<()> {
        self.tick()?;
        match &mut self.database_budget {
            Some((name, 0)) if name == database => Err(Error::Disconnected(format!(
                "connection to {name} closed"
            ))),
            Some((name, n)) if name == database => {
                *n -= 1;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn database(&self, name: &str) -> Result<&Database> {
        self.databases
            .get(name)
            .ok_or_else(|| rejected(format!("database \"{name}\" does not exist")))
    }

    fn database_mut(&mut self, name: &str) -> Result<&mut Database> {
        self.databases
            .get_mut(name)
            .ok_or_else(|| rejected(format!("database \"{name}\" does not exist")))
    }

    fn apply(&mut self, database: &str, ddl: &Ddl) -> Result<()> {
        self.tick_on(database)?;
        if self.reject.as_ref().is_some_and(|reject| reject(ddl)) {
            return Err(rejected(format!("refused: {ddl}")));
        }
        if let Ddl::CreateDatabase(name) = ddl {
            if self.databases.contains_key(name.as_str()) {
                return Err(rejected(format!("database \"{name}\" already exists")));
            }
            self.databases.insert(name.to_string(), Database::default());
        } else {
            self.database_mut(database)?.apply(ddl)?;
        }
        self.log.push((database.to_string(), ddl.clone()));
        Ok(())
    }
}

impl Database {
    fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| rejected(format!("relation \"{name}\" does not exist")))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| rejected(format!("relation \"{name}\" does not exist")))
    }

    fn check_type(&self, ty: &SqlType) -> Result<()> {
        match ty {
            SqlType::Named(name) if !self.types.contains_key(name.as_str()) => {
                Err(rejected(format!("type \"{name}\" does not exist")))
            }
            _ => Ok(()),
        }
    }

    fn check_reference(&self, table: &str, column: &str) -> Result<()> {
        if self.table(table)?.columns.contains_key(column) {
            Ok(())
        } else {
            Err(rejected(format!("column \"{column}\" of \"{table}\" does not exist")))
        }
    }

    fn apply(&mut self, ddl: &Ddl) -> Result<()> {
        match ddl {
            Ddl::CreateDatabase(_) => unreachable!("handled by the cluster"),
            Ddl::CreateTable(create) => self.create_table(create),
            Ddl::CreateEnumType { name, values } => {
                if self.types.contains_key(name.as_str()) {
                    return Err(rejected(format!("type \"{name}\" already exists")));
                }
                self.types.insert(name.to_string(), values.clone());
                Ok(())
            }
            Ddl::AddEnumValue { name, value } => {
                let values = self
                    .types
                    .get_mut(name.as_str())
                    .ok_or_else(|| rejected(format!("type \"{name}\" does not exist")))?;
                if !values.contains(value) {
                    values.push(value.clone());
                }
                Ok(())
            }
            Ddl::AddColumn { table, column } => {
                self.check_type(&column.ty)?;
                if let Some(reference) = &column.references {
                    self.check_reference(reference.table.as_str(), reference.column.as_str())?;
                }
                let t = self.table_mut(table.as_str())?;
                // IF NOT EXISTS
                if !t.columns.contains_key(column.name.as_str()) {
                    t.add_column(table.as_str(), column);
                }
                Ok(())
            }
            Ddl::AddConstraint { table, name, kind } => {
                if let ConstraintKind::ForeignKey { references, .. } = kind {
                    self.check_reference(references.table.as_str(), references.column.as_str())?;
                }
                let t = self.table_mut(table.as_str())?;
                let column = kind.column().to_string();
                if !t.columns.contains_key(&column) {
                    return Err(rejected(format!("column \"{column}\" does not exist")));
                }
                if t.constraints.contains_key(name.as_str()) {
                    return Err(rejected(format!("constraint \"{name}\" already exists")));
                }
                let keyed = match kind {
                    ConstraintKind::Unique(_) => Keyed::Unique(column),
                    ConstraintKind::NotNull(_) => Keyed::Check(column),
                    ConstraintKind::ForeignKey { .. } => Keyed::ForeignKey,
                };
                t.constraints.insert(name.to_string(), keyed);
                Ok(())
            }
            Ddl::DropConstraint { table, name } => {
                // IF EXISTS
                self.table_mut(table.as_str())?
                    .constraints
                    .shift_remove(name.as_str());
                Ok(())
            }
        }
    }

    fn create_table(&mut self, create: &CreateTable) -> Result<()> {
        let name = create.name.as_str();
        // IF NOT EXISTS
        if self.tables.contains_key(name) {
            return Ok(());
        }
        for column in &create.columns {
            self.check_type(&column.ty)?;
            if let Some(reference) = &column.references {
                self.check_reference(reference.table.as_str(), reference.column.as_str())?;
            }
        }
        let mut table = Table::default();
        for column in &create.columns {
            table.add_column(name, column);
        }
        self.tables.insert(name.to_string(), table);
        Ok(())
    }
}

impl Table {
    /// Add a column with its inline constraints, named the way Postgres
    /// names them.
    fn add_column(&mut self, table: &str, column: &ColumnDef) {
        let name = column.name.to_string();
        self.columns
            .insert(name.clone(), column.ty.catalog_name().to_string());
        if column.primary_key {
            self.constraints
                .insert(format!("{table}_pkey"), Keyed::PrimaryKey);
        } else if column.unique {
            self.constraints
                .insert(format!("{table}_{name}_key"), Keyed::Unique(name.clone()));
        }
        if column.references.is_some() {
            self.constraints
                .insert(format!("{table}_{name}_fkey"), Keyed::ForeignKey);
        }
    }
}

/// A shared in-memory cluster.
#[derive(Clone)]
pub(crate) struct MemoryServer {
    cluster: Arc<Mutex<Cluster>>,
}

impl MemoryServer {
    /// A cluster holding only the maintenance database.
    pub(crate) fn new() -> Self {
        let mut cluster = Cluster::default();
        cluster
            .databases
            .insert("postgres".to_string(), Database::default());
        Self {
            cluster: Arc::new(Mutex::new(cluster)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Cluster> {
        self.cluster.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `ddl` to `database` without logging it, to set up drift.
    pub(crate) fn seed(&self, database: &str, ddl: Ddl) {
        let mut cluster = self.lock();
        let log = cluster.log.len();
        cluster.apply(database, &ddl).unwrap();
        cluster.log.truncate(log);
    }

    /// Statements applied so far, rendered.
    pub(crate) fn statements(&self) -> Vec<String> {
        self.lock().log.iter().map(|(_, ddl)| ddl.to_string()).collect()
    }

    pub(crate) fn clear_log(&self) {
        self.lock().log.clear();
    }

    /// Refuse every statement `reject` matches.
    pub(crate) fn reject(&self, reject: impl Fn(&Ddl) -> bool + Send + 'static) {
        self.lock().reject = Some(Box::new(reject));
    }

    /// Stop refusing statements.
    pub(crate) fn accept_all(&self) {
        self.lock().reject = None;
    }

    /// Drop the connection after `calls` more lookups or statements.
    pub(crate) fn disconnect_after(&self, calls: usize) {
        self.lock().budget = Some(calls);
    }

    /// Drop the connection to `database` after `calls` more lookups or
    /// statements on it. Other connections stay up.
    pub(crate) fn disconnect_database_after(&self, database: &str, calls: usize) {
        self.lock().database_budget = Some((database.to_string(), calls));
    }

    pub(crate) fn has_database(&self, name: &str) -> bool {
        self.lock().databases.contains_key(name)
    }

    pub(crate) fn has_table(&self, database: &str, table: &str) -> bool {
        self.lock()
            .databases
            .get(database)
            .is_some_and(|db| db.tables.contains_key(table))
    }

    pub(crate) fn column_type(&self, database: &str, table: &str, column: &str) -> Option<String> {
        self.lock()
            .databases
            .get(database)?
            .tables
            .get(table)?
            .columns
            .get(column)
            .cloned()
    }

    pub(crate) fn constraint_names(&self, database: &str, table: &str) -> Vec<String> {
        self.lock()
            .databases
            .get(database)
            .and_then(|db| db.tables.get(table))
            .map(|t| t.constraints.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn enum_values(&self, database: &str, name: &str) -> Vec<String> {
        self.lock()
            .databases
            .get(database)
            .and_then(|db| db.types.get(name).cloned())
            .unwrap_or_default()
    }

    pub(crate) fn ledger_rows(&self, database: &str) -> Vec<(String, Outcome)> {
        self.lock()
            .databases
            .get(database)
            .map(|db| db.rows.clone())
            .unwrap_or_default()
    }
}

impl Server for MemoryServer {
    type Store = MemoryStore;

    async fn database_exists(&self, name: &str) -> Result<bool> {
        let mut cluster = self.lock();
        cluster.tick()?;
        Ok(cluster.databases.contains_key(name))
    }

    async fn create_database(&self, name: &DatabaseName) -> Result<()> {
        self.lock().apply("postgres", &Ddl::CreateDatabase(name.clone()))
    }

    async fn open(&self, database: &str) -> Result<Self::Store> {
        let mut cluster = self.lock();
        cluster.tick()?;
        cluster.database(database)?;
        Ok(MemoryStore {
            server: self.clone(),
            database: database.to_string(),
        })
    }
}

/// One database of a [`MemoryServer`].
pub(crate) struct MemoryStore {
    server: MemoryServer,
    database: String,
}

impl MemoryStore {
    fn read<T>(&self, f: impl FnOnce(&Database) -> T) -> Result<T> {
        let mut cluster = self.server.lock();
        cluster.tick_on(&self.database)?;
        Ok(f(cluster.database(&self.database)?))
    }
}

impl Inspector for MemoryStore {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        self.read(|db| db.tables.contains_key(table))
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        self.read(|db| {
            db.tables
                .get(table)
                .is_some_and(|t| t.columns.contains_key(column))
        })
    }

    async fn column_type(&self, table: &str, column: &str) -> Result<Option<String>> {
        self.read(|db| db.tables.get(table)?.columns.get(column).cloned())
    }

    async fn constraints_of(&self, table: &str) -> Result<Vec<Constraint>> {
        self.read(|db| {
            let Some(t) = db.tables.get(table) else {
                return Vec::new();
            };
            t.constraints
                .iter()
                .filter_map(|(name, keyed)| {
                    let (kind, column) = match keyed {
                        Keyed::Unique(column) => (ConstraintType::Unique, column),
                        Keyed::Check(column) => (ConstraintType::Check, column),
                        Keyed::PrimaryKey | Keyed::ForeignKey => return None,
                    };
                    Some(Constraint {
                        name: name.clone(),
                        kind,
                        columns: vec![column.clone()],
                    })
                })
                .collect()
        })
    }

    async fn constraint_exists(&self, table: &str, name: &str) -> Result<bool> {
        self.read(|db| {
            db.tables
                .get(table)
                .is_some_and(|t| t.constraints.contains_key(name))
        })
    }

    async fn type_exists(&self, name: &str) -> Result<bool> {
        self.read(|db| db.types.contains_key(name))
    }

    async fn enum_values(&self, name: &str) -> Result<Vec<String>> {
        self.read(|db| db.types.get(name).cloned().unwrap_or_default())
    }
}

impl Executor for MemoryStore {
    async fn apply(&self, ddl: &Ddl) -> Result<()> {
        self.server.lock().apply(&self.database, ddl)
    }
}

impl AuditSink for MemoryStore {
    async fn append(&self, table: &str, outcome: &Outcome, _at: DateTime<Utc>) -> Result<()> {
        let mut cluster = self.server.lock();
        cluster.tick_on(&self.database)?;
        let db = cluster.database_mut(&self.database)?;
        db.table(table)?;
        db.rows.push((table.to_string(), outcome.clone()));
        Ok(())
    }
}
