//! Symbol model: classes, interfaces and their members.
//!
//! These are the *own* records of a class as declared in the metadata, and
//! also the shape of the resolved model (after inheritance expansion the same
//! types carry the merged member sets).
//!
//! # Kinds
//!
//! | Declared as | [`ClassKind`] | Emitted as a document |
//! |-------------|---------------|-----------------------|
//! | class | `Class { concreteness: Concrete }` | yes |
//! | abstract class | `Class { concreteness: Abstract }` | no |
//! | interface | `Interface` | no |
//!
//! Abstract classes and interfaces stay in the symbol table so they can be
//! link targets and inheritance sources.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between namespace segments in fully-qualified names.
pub const NAMESPACE_SEPARATOR: char = '\\';

/// Extension of generated per-class documents.
pub const DOCUMENT_EXTENSION: &str = "md";

// ============================================================================
// Enums
// ============================================================================

/// Access control level of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// Keyword used in signatures.
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a class can be instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Concreteness {
    #[default]
    Concrete,
    Abstract,
}

/// Kind of a type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassKind {
    Class { concreteness: Concreteness },
    Interface,
}

impl Default for ClassKind {
    fn default() -> Self {
        ClassKind::Class {
            concreteness: Concreteness::Concrete,
        }
    }
}

impl ClassKind {
    pub fn is_interface(&self) -> bool {
        matches!(self, ClassKind::Interface)
    }

    pub fn is_abstract(&self) -> bool {
        matches!(
            self,
            ClassKind::Class {
                concreteness: Concreteness::Abstract
            }
        )
    }

    /// True for concrete classes, the only kind that gets its own document
    /// and index entries.
    pub fn is_documented(&self) -> bool {
        matches!(
            self,
            ClassKind::Class {
                concreteness: Concreteness::Concrete
            }
        )
    }

    /// Human-readable label for rendered output.
    pub fn label(&self) -> &'static str {
        match self {
            ClassKind::Class {
                concreteness: Concreteness::Concrete,
            } => "class",
            ClassKind::Class {
                concreteness: Concreteness::Abstract,
            } => "abstract class",
            ClassKind::Interface => "interface",
        }
    }
}

// ============================================================================
// Members
// ============================================================================

/// A `@see` or `@link` reference attached to a class or method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SeeAlso {
    pub link: String,
    pub description: String,
}

/// A method argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Argument {
    /// Argument name as declared (including any sigil such as `$`).
    pub name: String,
    /// Declared type; empty when untyped.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A method as visible on a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDefinition {
    pub name: String,
    pub visibility: Visibility,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    pub deprecated: bool,
    pub description: String,
    pub long_description: String,
    /// Return type expression, possibly a `|` union. Empty when undeclared.
    pub return_type: String,
    pub return_description: String,
    pub arguments: Vec<Argument>,
    /// Rendered signature for the class this definition is visible on.
    pub signature: String,
    /// Fully-qualified name of the class that declared the method.
    ///
    /// Inherited copies keep the original declarer.
    pub defined_by: String,
    pub see_also: Vec<SeeAlso>,
}

/// A property as visible on a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Default value text; empty when there is none.
    pub default: String,
    pub description: String,
    pub visibility: Visibility,
    #[serde(rename = "static")]
    pub is_static: bool,
    pub deprecated: bool,
    pub signature: String,
    pub defined_by: String,
}

/// A class constant. Constants are never inherited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstantDefinition {
    pub name: String,
    pub description: String,
    pub signature: String,
    pub value: String,
    pub deprecated: bool,
    pub defined_by: String,
}

// ============================================================================
// Class Definition
// ============================================================================

/// A class or interface with its member tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDefinition {
    /// Fully-qualified name without a leading separator (the table key).
    pub name: String,
    pub short_name: String,
    pub namespace: String,
    #[serde(flatten)]
    pub kind: ClassKind,
    pub deprecated: bool,
    pub description: String,
    pub long_description: String,
    /// Extended ancestors, in declaration order.
    pub extends: Vec<String>,
    /// Implemented interfaces, in declaration order.
    pub implements: Vec<String>,
    pub methods: IndexMap<String, MethodDefinition>,
    pub properties: IndexMap<String, PropertyDefinition>,
    pub constants: IndexMap<String, ConstantDefinition>,
    pub see_also: Vec<SeeAlso>,
    /// Default per-class document name (`Acme-Foo.md` for `Acme\Foo`).
    pub file_name: String,
}

impl ClassDefinition {
    /// Ancestor names in traversal order: `extends` first, then `implements`.
    pub fn ancestors(&self) -> impl Iterator<Item = &str> {
        self.extends
            .iter()
            .chain(self.implements.iter())
            .map(String::as_str)
    }

    /// Public methods in table order.
    pub fn public_methods(&self) -> impl Iterator<Item = &MethodDefinition> {
        self.methods
            .values()
            .filter(|m| m.visibility == Visibility::Public)
    }

    /// Whether a method was inherited rather than declared on this class.
    pub fn is_inherited(&self, method: &MethodDefinition) -> bool {
        method.defined_by != self.name
    }
}

// ============================================================================
// Name Helpers
// ============================================================================

/// Strip leading namespace separators from a class name.
pub fn normalize_class_name(name: &str) -> &str {
    name.trim_start_matches(NAMESPACE_SEPARATOR)
}

/// Replace namespace separators with dashes (`Acme\Foo` → `Acme-Foo`).
pub fn dashed_name(name: &str) -> String {
    normalize_class_name(name).replace(NAMESPACE_SEPARATOR, "-")
}

/// Default document name for a class.
pub fn document_file_name(name: &str) -> String {
    format!("{}.{}", dashed_name(name), DOCUMENT_EXTENSION)
}

/// Last namespace segment of a fully-qualified name.
pub fn short_name_of(name: &str) -> &str {
    let name = normalize_class_name(name);
    name.rsplit(NAMESPACE_SEPARATOR).next().unwrap_or(name)
}

/// Namespace part of a fully-qualified name (empty for the global namespace).
pub fn namespace_of(name: &str) -> &str {
    let name = normalize_class_name(name);
    name.rsplit_once(NAMESPACE_SEPARATOR)
        .map(|(ns, _)| ns)
        .unwrap_or("")
}
