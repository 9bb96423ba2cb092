//! Symbol table: class and interface definitions keyed by fully-qualified name.
//!
//! The table is built once from loader records and preserves source order.
//! Keys never carry a leading namespace separator; lookups accept names with
//! or without one.
//!
//! Building performs the per-record normalization the rest of the pipeline
//! relies on:
//! - leading separators stripped from the class name and every ancestor name
//! - a method returning its own class's fully-qualified name is recorded as
//!   returning the short name
//! - signatures rendered for every member
//! - `@link` tags whose description just repeats the link lose the description

use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use crate::error::{LoadError, LoadResult};
use crate::loader::{
    ConstantRecord, EntityKind, EntityRecord, MethodRecord, PropertyRecord, TagRecord,
};
use crate::model::{
    document_file_name, namespace_of, normalize_class_name, short_name_of, Argument,
    ClassDefinition, ClassKind, Concreteness, ConstantDefinition, MethodDefinition,
    PropertyDefinition, SeeAlso,
};
use crate::signature::{constant_signature, method_signature, property_signature};

/// Type used for properties that declare none.
pub const DEFAULT_PROPERTY_TYPE: &str = "mixed";

/// Ordered mapping of fully-qualified class name to definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SymbolTable {
    classes: IndexMap<String, ClassDefinition>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Build a table from loader records, in record order.
    ///
    /// A later record with an already-seen name replaces the earlier
    /// definition but keeps its position.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` for a record with an empty name or a member
    /// with an empty name.
    pub fn build(records: impl IntoIterator<Item = EntityRecord>) -> LoadResult<Self> {
        let mut table = SymbolTable::new();
        for (index, record) in records.into_iter().enumerate() {
            let class = build_class(index, record)?;
            if let Some(previous) = table.insert(class) {
                warn!(class = %previous.name, "duplicate class record, keeping the later one");
            }
        }
        Ok(table)
    }

    /// Insert a definition, returning the one it replaced.
    pub fn insert(&mut self, class: ClassDefinition) -> Option<ClassDefinition> {
        self.classes.insert(class.name.clone(), class)
    }

    /// Look up a class by fully-qualified name.
    pub fn get(&self, name: &str) -> Option<&ClassDefinition> {
        self.classes.get(normalize_class_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(normalize_class_name(name))
    }

    /// All definitions in source order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassDefinition> {
        self.classes.values()
    }

    /// All class names in source order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl<'a> IntoIterator for &'a SymbolTable {
    type Item = &'a ClassDefinition;
    type IntoIter = indexmap::map::Values<'a, String, ClassDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.classes.values()
    }
}

// ============================================================================
// Record Conversion
// ============================================================================

fn build_class(index: usize, record: EntityRecord) -> LoadResult<ClassDefinition> {
    let name = normalize_class_name(record.full_name.trim()).to_string();
    if name.is_empty() {
        return Err(LoadError::invalid_record(index, "empty full_name"));
    }

    let short_name = record
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| short_name_of(&name).to_string());
    let namespace = record
        .namespace
        .map(|ns| normalize_class_name(&ns).to_string())
        .unwrap_or_else(|| namespace_of(&name).to_string());

    let kind = match record.kind {
        EntityKind::Interface => ClassKind::Interface,
        EntityKind::Class if record.is_abstract => ClassKind::Class {
            concreteness: Concreteness::Abstract,
        },
        EntityKind::Class => ClassKind::Class {
            concreteness: Concreteness::Concrete,
        },
    };

    let mut methods = IndexMap::new();
    for method in record.methods {
        if method.name.is_empty() {
            return Err(LoadError::invalid_record(
                index,
                format!("method without a name in {}", name),
            ));
        }
        let method = build_method(method, &name, &short_name);
        methods.insert(method.name.clone(), method);
    }

    let mut properties = IndexMap::new();
    for property in record.properties {
        if property.name.is_empty() {
            return Err(LoadError::invalid_record(
                index,
                format!("property without a name in {}", name),
            ));
        }
        let property = build_property(property, &name);
        properties.insert(property.name.clone(), property);
    }

    let mut constants = IndexMap::new();
    for constant in record.constants {
        if constant.name.is_empty() {
            return Err(LoadError::invalid_record(
                index,
                format!("constant without a name in {}", name),
            ));
        }
        let constant = build_constant(constant, &name);
        constants.insert(constant.name.clone(), constant);
    }

    Ok(ClassDefinition {
        file_name: document_file_name(&name),
        short_name,
        namespace,
        kind,
        deprecated: record.deprecated,
        description: record.description,
        long_description: record.long_description,
        extends: normalize_names(record.extends),
        implements: normalize_names(record.implements),
        methods,
        properties,
        constants,
        see_also: see_also(record.see, record.links),
        name,
    })
}

fn build_method(record: MethodRecord, class_name: &str, short_name: &str) -> MethodDefinition {
    let return_type = if !record.return_type.is_empty()
        && normalize_class_name(&record.return_type) == class_name
    {
        short_name.to_string()
    } else {
        record.return_type
    };

    let arguments: Vec<Argument> = record
        .arguments
        .into_iter()
        .map(|arg| Argument {
            name: arg.name,
            type_name: arg.type_name,
            description: Some(arg.description).filter(|d| !d.is_empty()),
        })
        .collect();

    MethodDefinition {
        signature: method_signature(short_name, &record.name, &arguments, &return_type),
        name: record.name,
        visibility: record.visibility,
        is_abstract: record.is_abstract,
        is_static: record.is_static,
        deprecated: record.deprecated,
        description: record.description,
        long_description: record.long_description,
        return_type,
        return_description: record.return_description,
        arguments,
        defined_by: class_name.to_string(),
        see_also: see_also(record.see, record.links),
    }
}

fn build_property(record: PropertyRecord, class_name: &str) -> PropertyDefinition {
    let type_name = record
        .type_name
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_PROPERTY_TYPE.to_string());

    PropertyDefinition {
        signature: property_signature(record.visibility, &type_name, &record.name, &record.default),
        description: join_descriptions(&record.description, &record.long_description),
        name: record.name,
        type_name,
        default: record.default,
        visibility: record.visibility,
        is_static: record.is_static,
        deprecated: record.deprecated,
        defined_by: class_name.to_string(),
    }
}

fn build_constant(record: ConstantRecord, class_name: &str) -> ConstantDefinition {
    ConstantDefinition {
        signature: constant_signature(&record.name, &record.value),
        description: join_descriptions(&record.description, &record.long_description),
        name: record.name,
        value: record.value,
        deprecated: record.deprecated,
        defined_by: class_name.to_string(),
    }
}

fn normalize_names(names: Vec<String>) -> Vec<String> {
    names
        .iter()
        .map(|n| normalize_class_name(n.trim()).to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

/// `@see` tags first, then `@link` tags.
fn see_also(see: Vec<TagRecord>, links: Vec<TagRecord>) -> Vec<SeeAlso> {
    let see = see.into_iter().map(|tag| SeeAlso {
        link: tag.link,
        description: tag.description,
    });
    let links = links.into_iter().map(|tag| {
        let description = if tag.description == tag.link {
            String::new()
        } else {
            tag.description
        };
        SeeAlso {
            link: tag.link,
            description,
        }
    });
    see.chain(links).collect()
}

fn join_descriptions(description: &str, long_description: &str) -> String {
    match (description.is_empty(), long_description.is_empty()) {
        (false, false) => format!("{}\n\n{}", description, long_description),
        (false, true) => description.to_string(),
        (true, false) => long_description.to_string(),
        (true, true) => String::new(),
    }
}
