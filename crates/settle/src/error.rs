use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("failed to build connection pool: {0}")]
    PoolBuild(#[from] deadpool_postgres::BuildError),

    /// The store refused a statement without a Postgres error to carry,
    /// e.g. an in-memory store rejecting a duplicate object.
    #[error("statement rejected: {0}")]
    Rejected(String),

    /// The store is gone mid-run.
    #[error("store disconnected: {0}")]
    Disconnected(String),

    #[error("audit ledger error: {0}")]
    Ledger(String),
}

impl Error {
    /// Whether this error means the connection itself is unusable.
    ///
    /// Statement failures reported by the server carry a SQLSTATE and only
    /// fail the object being reconciled. Anything without one (closed socket,
    /// I/O, pool exhaustion) ends the run.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            Error::Postgres(e) => e.is_closed() || e.code().is_none(),
            Error::Pool(_) | Error::PoolBuild(_) | Error::Disconnected(_) => true,
            Error::Rejected(_) | Error::Ledger(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
