//! apidoc-md: cross-linked markdown API documentation.
//!
//! Turns normalized class metadata into markdown, either as one aggregated
//! document or as one document per class plus an index. Inherited members
//! are merged into every class and type names become links.

// Core model - re-exported from apidoc-core
pub use apidoc_core::link;
pub use apidoc_core::loader;
pub use apidoc_core::model;
pub use apidoc_core::resolve;
pub use apidoc_core::signature;
pub use apidoc_core::symbols;

// Pipeline
pub mod config;
pub mod error;
pub mod generator;
pub mod output;
pub mod render;
