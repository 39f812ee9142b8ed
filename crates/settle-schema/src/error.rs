use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that stop a description document from being read at all.
///
/// Problems with individual entries are [`crate::Diagnostic`]s instead.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: Utf8PathBuf, message: String },

    #[error("{path}: unsupported description format (expected .styx, .json or .yml)")]
    UnsupportedFormat { path: Utf8PathBuf },
}
