//! Metadata loading: normalized entity records.
//!
//! The analysis tool that produces API metadata is an external collaborator.
//! This module only consumes its *normalized* output: an ordered list of
//! entity records, one per class or interface, serialized as JSON.
//!
//! ## Accepted Shapes
//!
//! ```json
//! [ { "kind": "class", "full_name": "\\Acme\\Foo", ... }, ... ]
//! ```
//!
//! or the same list wrapped in an object:
//!
//! ```json
//! { "classes": [ ... ] }
//! ```
//!
//! Every field except `kind` and `full_name` is optional and defaults to an
//! empty value. Record order is preserved: it is the source order used for
//! the symbol table, the index and single-document output.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{LoadError, LoadResult};
use crate::model::Visibility;

// ============================================================================
// Record Types
// ============================================================================

/// Whether a record declares a class or an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    #[default]
    Class,
    Interface,
}

/// A `@see` / `@link` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TagRecord {
    pub link: String,
    pub description: String,
}

/// A declared method argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ArgumentRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
}

/// A declared method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MethodRecord {
    pub name: String,
    pub visibility: Visibility,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    pub deprecated: bool,
    pub description: String,
    pub long_description: String,
    pub return_type: String,
    pub return_description: String,
    pub arguments: Vec<ArgumentRecord>,
    pub see: Vec<TagRecord>,
    pub links: Vec<TagRecord>,
}

/// A declared property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PropertyRecord {
    pub name: String,
    /// Declared type; `None` falls back to `mixed`.
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub default: String,
    pub visibility: Visibility,
    #[serde(rename = "static")]
    pub is_static: bool,
    pub deprecated: bool,
    pub description: String,
    pub long_description: String,
}

/// A declared constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConstantRecord {
    pub name: String,
    pub value: String,
    pub deprecated: bool,
    pub description: String,
    pub long_description: String,
}

/// One class or interface as produced by the analysis tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EntityRecord {
    pub kind: EntityKind,
    /// Fully-qualified name, possibly with leading namespace separators.
    pub full_name: String,
    /// Short name; derived from `full_name` when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// Namespace; derived from `full_name` when absent.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub long_description: String,
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodRecord>,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
    #[serde(default)]
    pub constants: Vec<ConstantRecord>,
    #[serde(default)]
    pub see: Vec<TagRecord>,
    #[serde(default)]
    pub links: Vec<TagRecord>,
}

// ============================================================================
// Loader
// ============================================================================

/// Source of normalized entity records.
pub trait MetadataLoader {
    /// Load all records in source order.
    fn load(&self) -> LoadResult<Vec<EntityRecord>>;
}

/// Reads entity records from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonMetadataLoader {
    path: PathBuf,
}

impl JsonMetadataLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonMetadataLoader { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetadataLoader for JsonMetadataLoader {
    fn load(&self) -> LoadResult<Vec<EntityRecord>> {
        let content = fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        let records = parse_records(&content, &self.path.display().to_string())?;
        debug!(
            path = %self.path.display(),
            records = records.len(),
            "loaded metadata"
        );
        Ok(records)
    }
}

/// Parse entity records from a JSON string.
///
/// `origin` names the source in error messages.
pub fn parse_records(content: &str, origin: &str) -> LoadResult<Vec<EntityRecord>> {
    let json_err = |source| LoadError::Json {
        origin: origin.to_string(),
        source,
    };

    let document: Value = serde_json::from_str(content).map_err(json_err)?;
    let list = match document {
        Value::Array(_) => document,
        Value::Object(mut map) => match map.remove("classes") {
            Some(classes @ Value::Array(_)) => classes,
            Some(_) => {
                return Err(LoadError::UnexpectedShape {
                    origin: origin.to_string(),
                    reason: "\"classes\" must be an array".to_string(),
                })
            }
            None => {
                return Err(LoadError::UnexpectedShape {
                    origin: origin.to_string(),
                    reason: "expected an array of records or an object with \"classes\""
                        .to_string(),
                })
            }
        },
        _ => {
            return Err(LoadError::UnexpectedShape {
                origin: origin.to_string(),
                reason: "expected an array of records or an object with \"classes\"".to_string(),
            })
        }
    };

    serde_json::from_value(list).map_err(json_err)
}
