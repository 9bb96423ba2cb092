//! Error types for metadata loading and symbol table construction.
//!
//! Resolution and link building never fail: unknown ancestors and unknown
//! type names degrade to "no members" and "plain text" respectively. The only
//! fatal conditions in this crate come from reading and validating the input
//! metadata, and they abort the run before any output exists.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or validating entity records.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The metadata source could not be read.
    #[error("failed to read metadata from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The metadata source is not valid JSON or does not match the record shape.
    #[error("malformed metadata in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// The document parsed, but its top level is neither a record list nor `{"classes": [...]}`.
    #[error("malformed metadata in {origin}: {reason}")]
    UnexpectedShape { origin: String, reason: String },

    /// A record is structurally valid JSON but semantically unusable.
    #[error("invalid record #{index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// Result type for metadata operations.
pub type LoadResult<T> = Result<T, LoadError>;

impl LoadError {
    /// Create an `InvalidRecord` error.
    pub fn invalid_record(index: usize, reason: impl Into<String>) -> Self {
        LoadError::InvalidRecord {
            index,
            reason: reason.into(),
        }
    }
}
