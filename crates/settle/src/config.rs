//! Run configuration.
//!
//! Everything the engine needs to reach the cluster is passed in explicitly;
//! nothing is read from the environment here.

use std::fmt;

/// How to reach the Postgres cluster. The database name is chosen per target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub ssl_mode: SslMode,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: None,
            ssl_mode: SslMode::Prefer,
        }
    }
}

impl ConnectionConfig {
    /// A tokio-postgres config targeting `database`.
    pub fn pg_config(&self, database: &str) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .dbname(database)
            .ssl_mode(self.ssl_mode.into());
        if let Some(password) = &self.password {
            config.password(password);
        }
        config
    }
}

/// SSL preference, as libpq spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    Disable,
    #[default]
    Prefer,
    Require,
}

impl SslMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "disable" => Some(SslMode::Disable),
            "prefer" => Some(SslMode::Prefer),
            "require" => Some(SslMode::Require),
            _ => None,
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SslMode::Disable => write!(f, "disable"),
            SslMode::Prefer => write!(f, "prefer"),
            SslMode::Require => write!(f, "require"),
        }
    }
}

impl From<SslMode> for tokio_postgres::config::SslMode {
    fn from(mode: SslMode) -> Self {
        match mode {
            SslMode::Disable => tokio_postgres::config::SslMode::Disable,
            SslMode::Prefer => tokio_postgres::config::SslMode::Prefer,
            SslMode::Require => tokio_postgres::config::SslMode::Require,
        }
    }
}

/// Where outcomes are recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub database: String,
    pub table: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database: "info".to_string(),
            table: "sync_status".to_string(),
        }
    }
}

/// Everything one run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub connection: ConnectionConfig,
    /// Database to connect to for cluster-level lookups and CREATE DATABASE.
    pub maintenance_database: String,
    /// `None` disables the audit ledger.
    pub ledger: Option<LedgerConfig>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            maintenance_database: "postgres".to_string(),
            ledger: Some(LedgerConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.connection.host, "localhost");
        assert_eq!(config.connection.port, 5432);
        assert_eq!(config.maintenance_database, "postgres");
        let ledger = config.ledger.unwrap();
        assert_eq!(ledger.database, "info");
        assert_eq!(ledger.table, "sync_status");
    }

    #[test]
    fn test_ssl_mode_parse() {
        assert_eq!(SslMode::parse("require"), Some(SslMode::Require));
        assert_eq!(SslMode::parse("verify-full"), None);
        assert_eq!(SslMode::Disable.to_string(), "disable");
    }

    #[test]
    fn test_pg_config_targets_database() {
        let config = ConnectionConfig {
            password: Some("hunter2".into()),
            ..Default::default()
        };
        let pg = config.pg_config("shop");
        assert_eq!(pg.get_dbname(), Some("shop"));
        assert_eq!(pg.get_user(), Some("postgres"));
        assert_eq!(pg.get_password(), Some(&b"hunter2"[..]));
        assert_eq!(pg.get_ports(), &[5432]);
    }
}
