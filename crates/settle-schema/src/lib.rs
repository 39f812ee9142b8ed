//! Declarative schema model for settle.
//!
//! This crate holds everything that can be decided without a database:
//! - the naming policy ([`naming`]): normalisation and reserved names
//! - the schema model ([`Schema`] and friends)
//! - loading a description document (styx, JSON or YAML) into that model

mod document;
mod error;
mod load;
mod model;
pub mod naming;
mod validate;

pub use document::{ColumnEntry, DatabaseEntry, DescriptorEntry, Document, TableEntry};
pub use error::LoadError;
pub use load::{Format, Loaded, load, parse};
pub use model::{ColumnSpec, DatabaseSpec, DescriptorSpec, LogicalType, Schema, TableSpec};
pub use validate::{Diagnostic, validate};
