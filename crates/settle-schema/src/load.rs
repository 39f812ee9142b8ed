//! Read a description document from disk.

use crate::document::RawDocument;
use crate::error::LoadError;
use crate::{Diagnostic, Document, Schema, validate};
use camino::Utf8Path;

/// The syntax a description document is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Styx,
    Json,
    /// `.yml` or `.yaml`
    Yaml,
}

impl Format {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Utf8Path) -> Option<Self> {
        match path.extension() {
            Some("styx") => Some(Format::Styx),
            Some("json") => Some(Format::Json),
            Some("yml" | "yaml") => Some(Format::Yaml),
            _ => None,
        }
    }
}

/// A loaded description: the well-formed schema plus whatever was skipped.
#[derive(Debug, Clone, Default)]
pub struct Loaded {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse document source text.
///
/// Entries with the wrong shape are left out of the document and come back
/// as diagnostics. Errors are rendered messages for text that can't be read
/// as a document at all.
pub fn parse(source: &str, format: Format) -> Result<(Document, Vec<Diagnostic>), String> {
    let raw: RawDocument = match format {
        Format::Styx => facet_styx::from_str(source).map_err(|e| e.to_string())?,
        Format::Json => facet_json::from_str(source).map_err(|e| e.to_string())?,
        Format::Yaml => facet_yaml::from_str(source).map_err(|e| e.to_string())?,
    };
    Ok(raw.shape())
}

/// Load and validate a description document.
pub fn load(path: &Utf8Path) -> Result<Loaded, LoadError> {
    let format = Format::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat {
        path: path.to_owned(),
    })?;

    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;

    let (document, mut diagnostics) =
        parse(&source, format).map_err(|message| LoadError::Parse {
            path: path.to_owned(),
            message,
        })?;

    let (schema, invalid) = validate(&document);
    diagnostics.extend(invalid);
    tracing::debug!(
        %path,
        databases = schema.databases.len(),
        skipped = diagnostics.len(),
        "loaded schema description"
    );

    Ok(Loaded {
        schema,
        diagnostics,
    })
}
