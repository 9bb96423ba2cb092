//! JSON responses printed by the CLI.
//!
//! Every response starts with `status` and `schema_version`. Success and
//! error responses both go to stdout; logs go to stderr.

use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;

use apidoc_core::link::LinkMode;
use apidoc_core::model::ClassDefinition;

use crate::config::ResolvedConfig;
use crate::error::{ApidocError, OutputErrorCode};
use crate::generator::GenerationSummary;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Responses
// ============================================================================

/// Response for `generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub status: String,
    pub schema_version: String,
    pub mode: LinkMode,
    pub output_dir: PathBuf,
    /// Written documents, relative to `output_dir`.
    pub documents: Vec<PathBuf>,
    pub classes: usize,
    pub documented_classes: usize,
    pub index_entries: usize,
    /// Effective configuration, with the source of each value.
    pub config: ResolvedConfig,
}

impl GenerateResponse {
    pub fn new(summary: GenerationSummary, config: ResolvedConfig) -> Self {
        GenerateResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            mode: summary.mode,
            output_dir: summary.output_dir,
            documents: summary.documents,
            classes: summary.classes,
            documented_classes: summary.documented_classes,
            index_entries: summary.index_entries,
            config,
        }
    }
}

/// Response for `inspect`: resolved definitions.
#[derive(Debug, Clone, Serialize)]
pub struct InspectResponse<'a> {
    pub status: String,
    pub schema_version: String,
    /// Number of classes and interfaces in the table.
    pub classes: usize,
    pub definitions: Vec<&'a ClassDefinition>,
}

impl<'a> InspectResponse<'a> {
    pub fn new(classes: usize, definitions: Vec<&'a ClassDefinition>) -> Self {
        InspectResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            classes,
            definitions,
        }
    }
}

/// Error details.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: u8,
    pub message: String,
}

impl ErrorInfo {
    pub fn from_error(err: &ApidocError) -> Self {
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &ApidocError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Emit a response as pretty-printed JSON followed by a newline.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}
