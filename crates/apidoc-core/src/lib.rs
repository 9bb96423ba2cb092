//! Core model for apidoc-md.
//!
//! This crate turns normalized API metadata records into a resolved symbol
//! model ready for documentation rendering:
//! - Metadata loading from the normalized JSON record shape
//! - Symbol table of classes and interfaces in source order
//! - Inheritance expansion of methods and properties
//! - Canonical signatures for methods, properties and constants
//! - Navigation index and type-link resolution with anchor disambiguation
//!
//! ## Pipeline
//!
//! ```text
//! loader    → EntityRecord list (normalized metadata)
//!   ↓
//! symbols   → SymbolTable of own definitions
//!   ↓
//! resolve   → SymbolTable with inherited members merged in
//!   ↓
//! link      → index entries + inline type links
//! ```

pub mod error;
pub mod link;
pub mod loader;
pub mod model;
pub mod resolve;
pub mod signature;
pub mod symbols;

pub use error::{LoadError, LoadResult};
pub use link::{AnchorRegistry, IndexEntry, LinkMode, LinkResolver};
pub use loader::{EntityRecord, JsonMetadataLoader, MetadataLoader};
pub use model::{
    Argument, ClassDefinition, ClassKind, Concreteness, ConstantDefinition, MethodDefinition,
    PropertyDefinition, SeeAlso, Visibility,
};
pub use resolve::{resolve, InheritanceResolver};
pub use symbols::SymbolTable;
