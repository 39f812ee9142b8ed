//! The Postgres store.
//!
//! Catalog lookups are parameterised queries scoped to `current_schema()`.
//! DDL is rendered by `settle-sql`, where every name is quoted, and sent over
//! the simple query protocol.

use crate::config::ConnectionConfig;
use crate::outcome::Outcome;
use crate::store::{AuditSink, Constraint, ConstraintType, Executor, Inspector, Server};
use crate::traced::{Connection, ConnectionExt};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use settle_sql::{DatabaseName, Ddl, Ident, enum_type_name};
use tokio_postgres::NoTls;
use tokio_postgres::types::ToSql;

/// Builds one single-connection pool per database.
///
/// Postgres connections are bound to a database, so reconciling a cluster
/// means one connection per target.
#[derive(Debug, Clone)]
pub struct ConnectionProvider {
    config: ConnectionConfig,
}

impl ConnectionProvider {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    pub fn pool(&self, database: &str) -> Result<Pool> {
        let manager = Manager::from_config(
            self.config.pg_config(database),
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        Ok(Pool::builder(manager).max_size(1).build()?)
    }

    pub async fn connect(&self, database: &str) -> Result<(Pool, Object)> {
        let pool = self.pool(database)?;
        let conn = pool.get().await?;
        tracing::debug!(database, host = %self.config.host, "connected");
        Ok((pool, conn))
    }
}

/// The cluster, reached through its maintenance database.
pub struct PgServer {
    provider: ConnectionProvider,
    _pool: Pool,
    conn: Object,
}

impl PgServer {
    pub async fn connect(config: ConnectionConfig, maintenance_database: &str) -> Result<Self> {
        let provider = ConnectionProvider::new(config);
        let (pool, conn) = provider.connect(maintenance_database).await?;
        Ok(Self {
            provider,
            _pool: pool,
            conn,
        })
    }
}

impl Server for PgServer {
    type Store = PgStore<Object>;

    async fn database_exists(&self, name: &str) -> Result<bool> {
        let row = self
            .conn
            .traced()
            .query_one(
                "SELECT EXISTS (SELECT FROM pg_database WHERE datname::text = $1)",
                &[&name],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn create_database(&self, name: &DatabaseName) -> Result<()> {
        let ddl = Ddl::CreateDatabase(name.clone());
        self.conn.traced().batch_execute(&ddl.to_string()).await?;
        Ok(())
    }

    async fn open(&self, database: &str) -> Result<Self::Store> {
        let (pool, conn) = self.provider.connect(database).await?;
        Ok(PgStore {
            _pool: Some(pool),
            conn,
        })
    }
}

/// One open database.
pub struct PgStore<C: Connection> {
    _pool: Option<Pool>,
    conn: C,
}

impl<C: Connection> PgStore<C> {
    /// Wrap an existing connection.
    pub fn new(conn: C) -> Self {
        Self { _pool: None, conn }
    }

    async fn exists(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<bool> {
        let row = self.conn.traced().query_one(sql, params).await?;
        Ok(row.get(0))
    }
}

impl<C: Connection> Inspector for PgStore<C> {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        self.exists(
            "SELECT EXISTS (
                SELECT FROM pg_tables
                WHERE schemaname = current_schema() AND tablename::text = $1
            )",
            &[&table],
        )
        .await
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        self.exists(
            "SELECT EXISTS (
                SELECT FROM information_schema.columns
                WHERE table_schema::text = current_schema()
                  AND table_name::text = $1
                  AND column_name::text = $2
            )",
            &[&table, &column],
        )
        .await
    }

    async fn column_type(&self, table: &str, column: &str) -> Result<Option<String>> {
        let rows = self
            .conn
            .traced()
            .query(
                "SELECT data_type::text, udt_name::text
                FROM information_schema.columns
                WHERE table_schema::text = current_schema()
                  AND table_name::text = $1
                  AND column_name::text = $2",
                &[&table, &column],
            )
            .await?;
        Ok(rows.first().map(|row| {
            let data_type: String = row.get(0);
            if data_type == "USER-DEFINED" {
                row.get(1)
            } else {
                data_type
            }
        }))
    }

    async fn constraints_of(&self, table: &str) -> Result<Vec<Constraint>> {
        let rows = self
            .conn
            .traced()
            .query(
                "SELECT c.conname::text, c.contype::text,
                    ARRAY(
                        SELECT a.attname::text
                        FROM unnest(c.conkey) WITH ORDINALITY AS k(attnum, ord)
                        JOIN pg_attribute a ON a.attrelid = c.conrelid AND a.attnum = k.attnum
                        ORDER BY k.ord
                    )
                FROM pg_constraint c
                JOIN pg_class t ON t.oid = c.conrelid
                JOIN pg_namespace n ON n.oid = t.relnamespace
                WHERE n.nspname = current_schema()
                  AND t.relname::text = $1
                  AND c.contype IN ('u', 'c', 'x')
                ORDER BY c.conname",
                &[&table],
            )
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let code: String = row.get(1);
                Some(Constraint {
                    name: row.get(0),
                    kind: ConstraintType::from_code(&code)?,
                    columns: row.get(2),
                })
            })
            .collect())
    }

    async fn constraint_exists(&self, table: &str, name: &str) -> Result<bool> {
        self.exists(
            "SELECT EXISTS (
                SELECT FROM pg_constraint c
                JOIN pg_class t ON t.oid = c.conrelid
                JOIN pg_namespace n ON n.oid = t.relnamespace
                WHERE n.nspname = current_schema()
                  AND t.relname::text = $1
                  AND c.conname::text = $2
            )",
            &[&table, &name],
        )
        .await
    }

    async fn type_exists(&self, name: &str) -> Result<bool> {
        self.exists(
            "SELECT EXISTS (
                SELECT FROM pg_type t
                JOIN pg_namespace n ON n.oid = t.typnamespace
                WHERE n.nspname = current_schema() AND t.typname::text = $1
            )",
            &[&name],
        )
        .await
    }

    async fn enum_values(&self, name: &str) -> Result<Vec<String>> {
        let rows = self
            .conn
            .traced()
            .query(
                "SELECT e.enumlabel::text
                FROM pg_enum e
                JOIN pg_type t ON t.oid = e.enumtypid
                JOIN pg_namespace n ON n.oid = t.typnamespace
                WHERE n.nspname = current_schema() AND t.typname::text = $1
                ORDER BY e.enumsortorder",
                &[&name],
            )
            .await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }
}

impl<C: Connection> Executor for PgStore<C> {
    async fn apply(&self, ddl: &Ddl) -> Result<()> {
        self.conn.traced().batch_execute(&ddl.to_string()).await?;
        Ok(())
    }
}

impl<C: Connection> AuditSink for PgStore<C> {
    async fn append(&self, table: &str, outcome: &Outcome, at: DateTime<Utc>) -> Result<()> {
        // the status parameter goes in as text and is cast, since enum
        // parameters can't be bound from &str
        let sql = format!(
            "INSERT INTO {} (table_name, parent_table_name, table_type, database_name, entry_id, remote_id, sync_timestamp, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8::text::{})",
            Ident(table),
            Ident(enum_type_name(table, "status").as_str()),
        );
        let parent = outcome.parent.as_deref().unwrap_or_default();
        let remote_id: Option<&str> = None;
        let affected = self
            .conn
            .traced()
            .execute(
                &sql,
                &[
                    &outcome.table,
                    &parent,
                    &outcome.kind.as_str(),
                    &outcome.database,
                    &outcome.entry,
                    &remote_id,
                    &at,
                    &outcome.status.label(),
                ],
            )
            .await?;
        if affected != 1 {
            return Err(Error::Ledger(format!(
                "expected to insert 1 row into {table}, inserted {affected}"
            )));
        }
        Ok(())
    }
}
