//! Navigation index and type-link resolution.
//!
//! # Output Modes
//!
//! - **Multi-document**: one file per documented class. Links point at the
//!   class document, named by substituting the dash-joined class name for
//!   `%c` in the link template (`%c.md` by default).
//! - **Single-document**: everything lives in one aggregated document. Links
//!   are in-document anchors.
//!
//! # Anchors
//!
//! An anchor is the lower-cased label of a heading. Repeated anchors are
//! disambiguated in emission order the same way markdown hosts number
//! duplicate headings: the first `reset` stays `reset`, the second becomes
//! `reset-1`, the third `reset-2`. Index entries are registered first, so
//! their numbering matches the order of the class sections that follow.
//!
//! Multi-document links are not numbered: every index entry targets the
//! plain lower-cased label. A class `Reset` with a method `reset` therefore
//! gets two headings that hosts anchor as `reset` and `reset-1`, while both
//! index entries link to `#reset`.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::model::{dashed_name, ClassDefinition};
use crate::symbols::SymbolTable;

/// Placeholder for the dash-joined class name in link templates.
pub const CLASS_PLACEHOLDER: &str = "%c";

/// Default link template.
pub const DEFAULT_LINK_TEMPLATE: &str = "%c.md";

/// Separator between alternatives in a union type expression.
pub const UNION_SEPARATOR: char = '|';

/// How generated documents are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    SingleDocument,
    MultiDocument,
}

// ============================================================================
// Anchor Registry
// ============================================================================

/// Counts anchor occurrences and hands out disambiguated anchors.
#[derive(Debug, Clone, Default)]
pub struct AnchorRegistry {
    counts: HashMap<String, usize>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        AnchorRegistry::default()
    }

    /// Register one occurrence of `label` and return its anchor.
    pub fn register(&mut self, label: &str) -> String {
        let anchor = label.to_lowercase();
        let seen = self.counts.entry(anchor.clone()).or_insert(0);
        let result = if *seen == 0 {
            anchor
        } else {
            format!("{}-{}", anchor, seen)
        };
        *seen += 1;
        result
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

// ============================================================================
// Index Entries
// ============================================================================

/// One line of the navigation index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    /// Nesting level: 0 for classes, 1 for their methods.
    pub depth: usize,
    pub label: String,
    /// Fully-qualified name of the class the entry belongs to.
    pub class_name: String,
    /// Link target (`Foo.md#reset` or `#reset-1`).
    pub target: String,
}

impl fmt::Display for IndexEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}* [{}]({})",
            " ".repeat(self.depth * 4),
            self.label,
            self.target
        )
    }
}

/// Render index entries as a markdown bullet list, one line per entry.
pub fn render_index(entries: &[IndexEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.to_string());
        out.push('\n');
    }
    out
}

// ============================================================================
// Link Resolver
// ============================================================================

/// Builds the index and turns type names into links.
///
/// Expects the *resolved* table, so index entries include inherited public
/// methods.
#[derive(Debug)]
pub struct LinkResolver<'a> {
    table: &'a SymbolTable,
    mode: LinkMode,
    link_template: String,
    anchors: AnchorRegistry,
    class_anchors: HashMap<String, String>,
}

impl<'a> LinkResolver<'a> {
    pub fn new(table: &'a SymbolTable, mode: LinkMode, link_template: impl Into<String>) -> Self {
        LinkResolver {
            table,
            mode,
            link_template: link_template.into(),
            anchors: AnchorRegistry::new(),
            class_anchors: HashMap::new(),
        }
    }

    pub fn mode(&self) -> LinkMode {
        self.mode
    }

    pub fn link_template(&self) -> &str {
        &self.link_template
    }

    /// Build the navigation index.
    ///
    /// Classes are visited in source order. Interfaces and abstract classes
    /// get no entries. Each documented class yields a depth-0 entry for
    /// itself followed by a depth-1 entry per public method.
    ///
    /// Resets the anchor registry: index anchors always come first.
    pub fn build_index(&mut self) -> Vec<IndexEntry> {
        self.anchors.clear();
        self.class_anchors.clear();

        let table = self.table;
        let mut entries = Vec::new();
        for class in table.iter().filter(|c| c.kind.is_documented()) {
            let entry = self.index_entry(class, &class.short_name, 0);
            if self.mode == LinkMode::SingleDocument {
                // "#foo" → "foo"
                let anchor = entry.target.trim_start_matches('#').to_string();
                self.class_anchors.insert(class.name.clone(), anchor);
            }
            entries.push(entry);

            for method in class.public_methods() {
                entries.push(self.index_entry(class, &method.name, 1));
            }
        }
        entries
    }

    fn index_entry(&mut self, class: &ClassDefinition, label: &str, depth: usize) -> IndexEntry {
        let target = match self.mode {
            LinkMode::SingleDocument => format!("#{}", self.anchors.register(label)),
            LinkMode::MultiDocument => format!(
                "{}#{}",
                self.document_name(&class.name),
                label.to_lowercase()
            ),
        };
        IndexEntry {
            depth,
            label: label.to_string(),
            class_name: class.name.clone(),
            target,
        }
    }

    /// Document name for a class: the link template with `%c` replaced by
    /// the dash-joined class name.
    pub fn document_name(&self, class_name: &str) -> String {
        self.link_template
            .replace(CLASS_PLACEHOLDER, &dashed_name(class_name))
    }

    /// Anchor of a class heading in single-document mode.
    ///
    /// Documented classes use the anchor assigned while building the index;
    /// other classes fall back to their lower-cased short name.
    pub fn class_anchor(&self, class: &ClassDefinition) -> String {
        self.class_anchors
            .get(&class.name)
            .cloned()
            .unwrap_or_else(|| class.short_name.to_lowercase())
    }

    /// Link target for a known class, with an optional fragment.
    fn class_target(&self, class: &ClassDefinition, fragment: Option<&str>) -> String {
        match self.mode {
            LinkMode::MultiDocument => {
                let document = self.document_name(&class.name);
                match fragment {
                    Some(fragment) => format!("{}#{}", document, fragment),
                    None => document,
                }
            }
            LinkMode::SingleDocument => match fragment {
                Some(fragment) => format!("#{}", fragment),
                None => format!("#{}", self.class_anchor(class)),
            },
        }
    }

    /// Turn a (possibly union) type expression into markdown links.
    ///
    /// Each `|`-separated segment is trimmed of namespace separators and
    /// whitespace and looked up in the table. Known classes become
    /// `[label](target)`, with `label` defaulting to the segment. Anything
    /// else is passed through as plain text. Segments are rejoined with `|`.
    ///
    /// # Example
    ///
    /// ```
    /// # use apidoc_core::{LinkMode, LinkResolver, SymbolTable};
    /// # use apidoc_core::loader::parse_records;
    /// let records = parse_records(r#"[{"kind": "class", "full_name": "Foo"}]"#, "doc").unwrap();
    /// let table = SymbolTable::build(records).unwrap();
    /// let links = LinkResolver::new(&table, LinkMode::MultiDocument, "%c.md");
    /// assert_eq!(links.resolve_type_link("\\Foo|Bar", None, None), "[Foo](Foo.md)|Bar");
    /// ```
    pub fn resolve_type_link(
        &self,
        type_expression: &str,
        label: Option<&str>,
        fragment: Option<&str>,
    ) -> String {
        type_expression
            .split(UNION_SEPARATOR)
            .map(|segment| {
                let segment = segment.trim_matches(|c: char| c == '\\' || c.is_whitespace());
                match self.table.get(segment) {
                    Some(class) => format!(
                        "[{}]({})",
                        label.unwrap_or(segment),
                        self.class_target(class, fragment)
                    ),
                    None => segment.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join("|")
    }
}
