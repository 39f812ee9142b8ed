//! Configuration file handling for settle.
//!
//! Looks for `.config/settle.styx` in the current directory or any parent
//! directory. Every setting is optional; the environment and command-line
//! flags are layered on top in [`Settings::resolve`].

use camino::Utf8PathBuf;
use facet::Facet;
use settle::{ConnectionConfig, LedgerConfig, RunConfig, SslMode};
use std::path::{Path, PathBuf};

/// The contents of `.config/settle.styx`.
#[derive(Debug, Clone, Default, Facet)]
pub struct Config {
    #[facet(default)]
    pub connection: ConnectionSection,

    /// Path to the schema description document.
    #[facet(default)]
    pub schema: Option<String>,

    /// Database used for cluster-level statements. Defaults to `postgres`.
    #[facet(default)]
    pub maintenance_database: Option<String>,

    #[facet(default)]
    pub ledger: LedgerSection,
}

#[derive(Debug, Clone, Default, Facet)]
pub struct ConnectionSection {
    #[facet(default)]
    pub host: Option<String>,

    #[facet(default)]
    pub port: Option<u16>,

    #[facet(default)]
    pub user: Option<String>,

    #[facet(default)]
    pub password: Option<String>,

    /// `disable`, `prefer` or `require`.
    #[facet(default)]
    pub sslmode: Option<String>,
}

#[derive(Debug, Clone, Default, Facet)]
pub struct LedgerSection {
    /// Set to false to skip the audit ledger.
    #[facet(default)]
    pub enabled: Option<bool>,

    #[facet(default)]
    pub database: Option<String>,

    #[facet(default)]
    pub table: Option<String>,
}

/// Load configuration from `.config/settle.styx`, searching up the directory tree.
pub fn load() -> Result<(Config, PathBuf), ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(e.to_string()))?;
    load_from(&cwd)
}

/// Load configuration starting from a specific directory.
pub fn load_from(start: &Path) -> Result<(Config, PathBuf), ConfigError> {
    let config_path = find_config_file(start)?;
    let content =
        std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io(e.to_string()))?;

    let config: Config =
        facet_styx::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    Ok((config, config_path))
}

/// Find `.config/settle.styx` by searching up the directory tree.
fn find_config_file(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".config/settle.styx");
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(ConfigError::NotFound);
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// No `.config/settle.styx` found in any parent directory
    NotFound,
    /// I/O error reading the file
    Io(String),
    /// Parse error in the Styx file
    Parse(String),
    /// A value that parsed but makes no sense
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound => {
                write!(
                    f,
                    "No .config/settle.styx found in current directory or any parent"
                )
            }
            ConfigError::Io(e) => write!(f, "Failed to read .config/settle.styx: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse .config/settle.styx: {}", e),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Values given on the command line. `None` means not given.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub schema: Option<Utf8PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub ledger_database: Option<String>,
    pub no_ledger: bool,
}

/// Everything a run needs, after layering.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub run: RunConfig,
    pub schema: Utf8PathBuf,
}

impl Settings {
    /// Layer defaults, the config file, the environment and the command line,
    /// later layers winning.
    ///
    /// `env` looks up `DATABASE_HOST`, `DATABASE_PORT`, `DATABASE_USERNAME`,
    /// `DATABASE_PASSWORD` and `DATABASE_SSLMODE`. `exists` picks the first
    /// of the default schema documents present: `config.styx`, `config.yml`,
    /// then `config.json`.
    pub fn resolve(
        file: Config,
        env: impl Fn(&str) -> Option<String>,
        overrides: Overrides,
        exists: impl Fn(&Utf8PathBuf) -> bool,
    ) -> Result<Self, ConfigError> {
        let defaults = ConnectionConfig::default();

        let env_port = match env("DATABASE_PORT") {
            Some(raw) => Some(raw.parse::<u16>().map_err(|_| {
                ConfigError::Invalid(format!("DATABASE_PORT={raw} is not a port number"))
            })?),
            None => None,
        };

        let ssl_raw = env("DATABASE_SSLMODE").or(file.connection.sslmode);
        let ssl_mode = match ssl_raw {
            Some(raw) => SslMode::parse(&raw).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "ssl mode {raw:?} is not one of disable, prefer, require"
                ))
            })?,
            None => defaults.ssl_mode,
        };

        let connection = ConnectionConfig {
            host: overrides
                .host
                .or_else(|| env("DATABASE_HOST"))
                .or(file.connection.host)
                .unwrap_or(defaults.host),
            port: overrides
                .port
                .or(env_port)
                .or(file.connection.port)
                .unwrap_or(defaults.port),
            user: overrides
                .user
                .or_else(|| env("DATABASE_USERNAME"))
                .or(file.connection.user)
                .unwrap_or(defaults.user),
            password: env("DATABASE_PASSWORD").or(file.connection.password),
            ssl_mode,
        };

        let ledger = if overrides.no_ledger || file.ledger.enabled == Some(false) {
            None
        } else {
            let default = LedgerConfig::default();
            Some(LedgerConfig {
                database: overrides
                    .ledger_database
                    .or(file.ledger.database)
                    .unwrap_or(default.database),
                table: file.ledger.table.unwrap_or(default.table),
            })
        };

        let schema = match overrides.schema.or(file.schema.map(Utf8PathBuf::from)) {
            Some(schema) => schema,
            None => ["config.styx", "config.yml"]
                .map(Utf8PathBuf::from)
                .into_iter()
                .find(|path| exists(path))
                .unwrap_or_else(|| Utf8PathBuf::from("config.json")),
        };

        Ok(Settings {
            run: RunConfig {
                connection,
                maintenance_database: file
                    .maintenance_database
                    .unwrap_or_else(|| RunConfig::default().maintenance_database),
                ledger,
            },
            schema,
        })
    }
}
