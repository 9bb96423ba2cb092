//! Unified error type and exit codes for apidoc-md.
//!
//! Subsystem errors (`LoadError`, `ConfigError`, `RenderError`, write
//! failures) are bridged into [`ApidocError`], which is what the CLI renders
//! as a JSON error response.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments or configuration
//! - `3`: Input metadata errors (missing, malformed, invalid records)
//! - `4`: Output write errors
//! - `5`: Template errors
//! - `10`: Internal errors

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use apidoc_core::error::LoadError;

use crate::config::ConfigError;
use crate::render::RenderError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Stable numeric error codes, used as process exit codes and in JSON
/// error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Bad command-line arguments or configuration values.
    InvalidArguments = 2,
    /// Input metadata could not be read or understood.
    InputError = 3,
    /// Generated documents could not be written.
    WriteError = 4,
    /// Templates missing, unreadable or malformed.
    TemplateError = 5,
    /// Bugs and unexpected state.
    InternalError = 10,
}

impl OutputErrorCode {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for the CLI.
#[derive(Debug, Error)]
pub enum ApidocError {
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("class not found: {name}")]
    ClassNotFound { name: String },

    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl ApidocError {
    pub fn invalid_args(message: impl Into<String>) -> Self {
        ApidocError::InvalidArguments {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApidocError::InternalError {
            message: message.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ApidocError::Write {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the root crate.
pub type ApidocResult<T> = Result<T, ApidocError>;

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&ApidocError> for OutputErrorCode {
    fn from(err: &ApidocError) -> Self {
        match err {
            ApidocError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            ApidocError::Config(_) => OutputErrorCode::InvalidArguments,
            ApidocError::Load(_) => OutputErrorCode::InputError,
            ApidocError::ClassNotFound { .. } => OutputErrorCode::InputError,
            ApidocError::Render(_) => OutputErrorCode::TemplateError,
            ApidocError::Write { .. } => OutputErrorCode::WriteError,
            ApidocError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<ApidocError> for OutputErrorCode {
    fn from(err: ApidocError) -> Self {
        OutputErrorCode::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_exit_code_table() {
        assert_eq!(OutputErrorCode::InvalidArguments.code(), 2);
        assert_eq!(OutputErrorCode::InputError.code(), 3);
        assert_eq!(OutputErrorCode::WriteError.code(), 4);
        assert_eq!(OutputErrorCode::TemplateError.code(), 5);
        assert_eq!(OutputErrorCode::InternalError.code(), 10);
        assert_eq!(OutputErrorCode::TemplateError.to_string(), "5");
    }

    #[test]
    fn subsystem_errors_map_to_codes() {
        let load: ApidocError = LoadError::invalid_record(0, "empty full_name").into();
        assert_eq!(OutputErrorCode::from(&load), OutputErrorCode::InputError);

        let render: ApidocError = RenderError::TemplateNotFound {
            path: PathBuf::from("tpl/class.md"),
        }
        .into();
        assert_eq!(OutputErrorCode::from(&render), OutputErrorCode::TemplateError);

        let config: ApidocError = ConfigError::InvalidValue {
            key: "linkTemplate".to_string(),
            value: "docs.md".to_string(),
            reason: "missing %c".to_string(),
        }
        .into();
        assert_eq!(OutputErrorCode::from(config), OutputErrorCode::InvalidArguments);

        let write = ApidocError::write("out/README.md", io::Error::other("disk full"));
        assert_eq!(OutputErrorCode::from(&write), OutputErrorCode::WriteError);
        assert!(write.to_string().contains("out/README.md"));
    }

    #[test]
    fn transparent_variants_keep_source_message() {
        let err: ApidocError = LoadError::invalid_record(3, "method without a name in Foo").into();
        assert_eq!(
            err.to_string(),
            LoadError::invalid_record(3, "method without a name in Foo").to_string()
        );
    }
}
