//! Markdown rendering of the resolved model.
//!
//! Rendering is split between code and templates. Code turns member lists
//! (methods, properties, constants, see-also) into markdown blocks; a small
//! template then places those blocks with `{{placeholder}}` substitution.
//!
//! ## Templates
//!
//! Two templates are used, read from the configured template directory or
//! taken from the built-in defaults:
//!
//! | File | Placeholders |
//! |------|--------------|
//! | `class.md` | `name`, `short_name`, `namespace`, `kind`, `deprecated`, `description`, `parents`, `see_also`, `constants`, `properties`, `methods` |
//! | `index.md` | `title`, `index` |
//!
//! A template naming any other placeholder is rejected when loaded.
//!
//! ## Headings
//!
//! In single-document mode, link anchors are computed ahead of rendering from
//! the class and public-method headings. Class sections therefore emit
//! exactly one heading per class and one per public method; other members
//! use bold labels.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use apidoc_core::link::{render_index, IndexEntry, LinkResolver};
use apidoc_core::model::{
    ClassDefinition, ConstantDefinition, MethodDefinition, PropertyDefinition, SeeAlso, Visibility,
};
use apidoc_core::symbols::SymbolTable;

/// File name of the class section template.
pub const CLASS_TEMPLATE: &str = "class.md";

/// File name of the index template.
pub const INDEX_TEMPLATE: &str = "index.md";

const BUILTIN_CLASS_TEMPLATE: &str = include_str!("../templates/class.md");
const BUILTIN_INDEX_TEMPLATE: &str = include_str!("../templates/index.md");

const CLASS_PLACEHOLDERS: &[&str] = &[
    "name",
    "short_name",
    "namespace",
    "kind",
    "deprecated",
    "description",
    "parents",
    "see_also",
    "constants",
    "properties",
    "methods",
];

const INDEX_PLACEHOLDERS: &[&str] = &["title", "index"];

/// Language hint on signature code fences.
const CODE_FENCE_LANGUAGE: &str = "php";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

static OUTER_PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^<p>|</p>$").unwrap());

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template not found: {}", .path.display())]
    TemplateNotFound { path: PathBuf },

    #[error("failed to read template {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unknown placeholder '{{{{{name}}}}}' in template {template}")]
    UnknownPlaceholder { template: String, name: String },
}

pub type RenderResult<T> = Result<T, RenderError>;

// ============================================================================
// Templates
// ============================================================================

/// The class and index templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    class: String,
    index: String,
}

impl Templates {
    /// The templates shipped with the binary.
    pub fn builtin() -> Self {
        Templates {
            class: BUILTIN_CLASS_TEMPLATE.to_string(),
            index: BUILTIN_INDEX_TEMPLATE.to_string(),
        }
    }

    /// Read `class.md` and `index.md` from `dir`.
    ///
    /// # Errors
    ///
    /// `TemplateNotFound` when either file is missing, `Io` when it cannot
    /// be read, `UnknownPlaceholder` when it names a placeholder the
    /// renderer does not supply.
    pub fn load(dir: &Path) -> RenderResult<Self> {
        let templates = Templates {
            class: read_template(&dir.join(CLASS_TEMPLATE))?,
            index: read_template(&dir.join(INDEX_TEMPLATE))?,
        };
        check_placeholders(CLASS_TEMPLATE, &templates.class, CLASS_PLACEHOLDERS)?;
        check_placeholders(INDEX_TEMPLATE, &templates.index, INDEX_PLACEHOLDERS)?;
        Ok(templates)
    }

    /// Built-in templates when `dir` is `None`, otherwise [`Templates::load`].
    pub fn from_dir(dir: Option<&Path>) -> RenderResult<Self> {
        match dir {
            Some(dir) => Templates::load(dir),
            None => Ok(Templates::builtin()),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn index(&self) -> &str {
        &self.index
    }
}

fn read_template(path: &Path) -> RenderResult<String> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => RenderError::TemplateNotFound {
            path: path.to_path_buf(),
        },
        _ => RenderError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn check_placeholders(template: &str, text: &str, known: &[&str]) -> RenderResult<()> {
    for caps in PLACEHOLDER.captures_iter(text) {
        let name = &caps[1];
        if !known.contains(&name) {
            return Err(RenderError::UnknownPlaceholder {
                template: template.to_string(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Replace every `{{name}}` in `text` with its value from `values`.
///
/// # Errors
///
/// `UnknownPlaceholder` if `text` names a placeholder missing from `values`.
pub fn substitute(template: &str, text: &str, values: &[(&str, String)]) -> RenderResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = values
            .iter()
            .find(|(key, _)| *key == name.as_str())
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| RenderError::UnknownPlaceholder {
                template: template.to_string(),
                name: name.as_str().to_string(),
            })?;
        out.push_str(&text[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

/// Strip one leading `<p>` and one trailing `</p>` from `text`.
///
/// Inner paragraph tags are kept.
pub fn strip_outer_paragraph_tags(text: &str) -> String {
    OUTER_PARAGRAPH.replace_all(text, "").into_owned()
}

// ============================================================================
// Renderer
// ============================================================================

/// Everything a renderer may consult besides the class itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// The resolved table.
    pub table: &'a SymbolTable,
    /// Link resolver with the index already built.
    pub links: &'a LinkResolver<'a>,
}

/// Produces document text from the resolved model.
pub trait DocumentRenderer {
    /// Render the section of one documented class.
    fn render_class(&self, class: &ClassDefinition, ctx: &RenderContext<'_>)
        -> RenderResult<String>;

    /// Render the index document header and navigation list.
    fn render_index(&self, title: &str, entries: &[IndexEntry]) -> RenderResult<String>;
}

/// Template-driven markdown renderer.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    templates: Templates,
}

impl TemplateRenderer {
    pub fn new(templates: Templates) -> Self {
        TemplateRenderer { templates }
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        TemplateRenderer::new(Templates::builtin())
    }
}

impl DocumentRenderer for TemplateRenderer {
    fn render_class(
        &self,
        class: &ClassDefinition,
        ctx: &RenderContext<'_>,
    ) -> RenderResult<String> {
        let values = [
            ("name", class.name.clone()),
            ("short_name", class.short_name.clone()),
            ("namespace", class.namespace.clone()),
            ("kind", class.kind.label().to_string()),
            ("deprecated", deprecated_block(class.deprecated)),
            (
                "description",
                description_block(&class.description, &class.long_description),
            ),
            ("parents", parents_block(class, ctx)),
            ("see_also", see_also_block(&class.see_also)),
            ("constants", constants_block(class.constants.values())),
            ("properties", properties_block(class, ctx)),
            ("methods", methods_block(class, ctx)),
        ];
        substitute(CLASS_TEMPLATE, &self.templates.class, &values)
    }

    fn render_index(&self, title: &str, entries: &[IndexEntry]) -> RenderResult<String> {
        let values = [
            ("title", title.to_string()),
            ("index", render_index(entries)),
        ];
        substitute(INDEX_TEMPLATE, &self.templates.index, &values)
    }
}

// ============================================================================
// Blocks
// ============================================================================

// Every non-empty block ends with a blank line.

fn deprecated_block(deprecated: bool) -> String {
    if deprecated {
        "> **Deprecated**\n\n".to_string()
    } else {
        String::new()
    }
}

fn description_block(description: &str, long_description: &str) -> String {
    let mut out = String::new();
    for text in [description, long_description] {
        let text = text.trim();
        if !text.is_empty() {
            out.push_str(text);
            out.push_str("\n\n");
        }
    }
    out
}

fn parents_block(class: &ClassDefinition, ctx: &RenderContext<'_>) -> String {
    let mut out = String::new();
    if !class.extends.is_empty() {
        let label = if class.kind.is_interface() {
            "This interface extends"
        } else {
            "Parent class"
        };
        out.push_str(&format!("* {}: {}\n", label, type_list(&class.extends, ctx)));
    }
    if !class.implements.is_empty() {
        out.push_str(&format!(
            "* This class implements: {}\n",
            type_list(&class.implements, ctx)
        ));
    }
    if class.kind.is_abstract() {
        out.push_str("* This class is an **Abstract class**\n");
    }
    if class.deprecated {
        out.push_str("* **Warning:** this class is **deprecated**. This means that this class will likely be removed in a future version.\n");
    }
    out
}

fn type_list(names: &[String], ctx: &RenderContext<'_>) -> String {
    names
        .iter()
        .map(|name| ctx.links.resolve_type_link(name, None, None))
        .collect::<Vec<_>>()
        .join(", ")
}

fn see_also_block(see_also: &[SeeAlso]) -> String {
    if see_also.is_empty() {
        return String::new();
    }
    let mut out = String::from("**See Also:**\n\n");
    for see in see_also {
        if see.description.is_empty() {
            out.push_str(&format!("* {}\n", see.link));
        } else {
            out.push_str(&format!("* {} - {}\n", see.link, see.description));
        }
    }
    out.push('\n');
    out
}

fn constants_block<'c>(constants: impl Iterator<Item = &'c ConstantDefinition>) -> String {
    let mut out = String::new();
    for constant in constants {
        if out.is_empty() {
            out.push_str("**Constants**\n\n");
        }
        out.push_str(&format!("* `{}`", constant.signature));
        if constant.deprecated {
            out.push_str(" *(deprecated)*");
        }
        let description = strip_outer_paragraph_tags(constant.description.trim());
        if !description.is_empty() {
            out.push_str(": ");
            out.push_str(&description);
        }
        out.push('\n');
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn properties_block(class: &ClassDefinition, ctx: &RenderContext<'_>) -> String {
    if class.properties.is_empty() {
        return String::new();
    }
    let mut out = String::from("**Properties**\n\n");
    for property in class.properties.values() {
        out.push_str(&property_line(property, class, ctx));
    }
    out.push('\n');
    out
}

fn property_line(
    property: &PropertyDefinition,
    class: &ClassDefinition,
    ctx: &RenderContext<'_>,
) -> String {
    let mut line = format!("* `{}`", property.signature);
    if property.is_static {
        line.push_str(" *(static)*");
    }
    if property.deprecated {
        line.push_str(" *(deprecated)*");
    }
    let description = strip_outer_paragraph_tags(property.description.trim());
    if !description.is_empty() {
        line.push_str(": ");
        line.push_str(&description);
    }
    if property.defined_by != class.name {
        line.push_str(&format!(" (inherited from {})", declarer_link(&property.defined_by, ctx)));
    }
    line.push('\n');
    line
}

fn methods_block(class: &ClassDefinition, ctx: &RenderContext<'_>) -> String {
    let mut out = String::new();
    for method in class.public_methods() {
        out.push_str(&public_method_section(method, class, ctx));
    }

    let hidden: Vec<&MethodDefinition> = class
        .methods
        .values()
        .filter(|m| m.visibility != Visibility::Public)
        .collect();
    if !hidden.is_empty() {
        out.push_str("**Non-public methods**\n\n");
        for method in hidden {
            out.push_str(&format!("* `{}` *({})*", method.signature, method.visibility));
            let description = strip_outer_paragraph_tags(method.description.trim());
            if !description.is_empty() {
                out.push_str(": ");
                out.push_str(&description);
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

fn public_method_section(
    method: &MethodDefinition,
    class: &ClassDefinition,
    ctx: &RenderContext<'_>,
) -> String {
    let mut out = format!("### {}\n\n", method.name);
    out.push_str(&deprecated_block(method.deprecated));
    out.push_str(&description_block(&method.description, &method.long_description));
    out.push_str(&format!(
        "```{}\n{}\n```\n\n",
        CODE_FENCE_LANGUAGE, method.signature
    ));

    let mut notes = String::new();
    if method.is_static {
        notes.push_str("* This method is **static**.\n");
    }
    if method.is_abstract {
        notes.push_str("* This method is **abstract**.\n");
    }
    if method.deprecated {
        notes.push_str("* **Warning:** this method is **deprecated**. This means that this method will likely be removed in a future version.\n");
    }
    if class.is_inherited(method) {
        notes.push_str(&format!(
            "* Inherited from {}\n",
            declarer_link(&method.defined_by, ctx)
        ));
    }
    if !notes.is_empty() {
        out.push_str(&notes);
        out.push('\n');
    }

    if !method.arguments.is_empty() {
        out.push_str("**Parameters:**\n\n");
        out.push_str("| Parameter | Type | Description |\n");
        out.push_str("|-----------|------|-------------|\n");
        for arg in &method.arguments {
            let type_link = if arg.type_name.is_empty() {
                String::new()
            } else {
                format!("**{}**", ctx.links.resolve_type_link(&arg.type_name, None, None))
            };
            let description = arg
                .description
                .as_deref()
                .map(|d| strip_outer_paragraph_tags(d.trim()))
                .unwrap_or_default();
            out.push_str(&format!(
                "| `{}` | {} | {} |\n",
                arg.name, type_link, description
            ));
        }
        out.push('\n');
    }

    if !method.return_type.is_empty() {
        out.push_str("**Return Value:**\n\n");
        out.push_str(&ctx.links.resolve_type_link(&method.return_type, None, None));
        let description = strip_outer_paragraph_tags(method.return_description.trim());
        if !description.is_empty() {
            out.push_str(" - ");
            out.push_str(&description);
        }
        out.push_str("\n\n");
    }

    out.push_str(&see_also_block(&method.see_also));
    out.push_str("---\n\n");
    out
}

/// Link to the class that declared an inherited member, labelled with its
/// short name.
fn declarer_link(defined_by: &str, ctx: &RenderContext<'_>) -> String {
    match ctx.table.get(defined_by) {
        Some(declarer) => ctx
            .links
            .resolve_type_link(defined_by, Some(declarer.short_name.as_str()), None),
        None => defined_by.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidoc_core::link::{LinkMode, DEFAULT_LINK_TEMPLATE};
    use apidoc_core::loader::parse_records;
    use apidoc_core::resolve::resolve;
    use serde_json::json;
    use tempfile::TempDir;

    fn resolved(records: serde_json::Value) -> SymbolTable {
        let own = SymbolTable::build(parse_records(&records.to_string(), "test").unwrap()).unwrap();
        resolve(&own)
    }

    fn fixture() -> SymbolTable {
        resolved(json!([
            {"kind": "class", "full_name": "Acme\\Base", "abstract": true,
             "properties": [
                {"name": "$id", "type": "int", "visibility": "protected"},
                {"name": "$secret", "visibility": "private"}
             ],
             "methods": [{"name": "describe", "return_type": "string",
                          "description": "<p>Describe the thing.</p>"}]},
            {"kind": "class", "full_name": "Acme\\Timer", "extends": ["Acme\\Base"],
             "description": "A timer.", "long_description": "Counts ticks.",
             "constants": [{"name": "MAX", "value": "10", "description": "Upper bound."}],
             "methods": [
                {"name": "start", "return_type": "\\Acme\\Timer",
                 "arguments": [{"name": "$delay", "type": "int", "description": "<p>Delay in ms.</p>"},
                               {"name": "$base", "type": "Acme\\Base|null"}],
                 "return_description": "Fluent."},
                {"name": "tick", "visibility": "protected", "description": "One tick."}
             ],
             "see": [{"link": "https://example.com/timer", "description": "Docs"}]}
        ]))
    }

    fn render_timer(mode: LinkMode) -> String {
        let table = fixture();
        let mut links = LinkResolver::new(&table, mode, DEFAULT_LINK_TEMPLATE);
        links.build_index();
        let ctx = RenderContext {
            table: &table,
            links: &links,
        };
        let timer = table.get("Acme\\Timer").unwrap();
        TemplateRenderer::default().render_class(timer, &ctx).unwrap()
    }

    // ========================================================================
    // Substitution
    // ========================================================================

    #[test]
    fn substitute_replaces_placeholders() {
        let out = substitute(
            "t",
            "# {{title}}\n{{ body }}!",
            &[("title", "Hi".to_string()), ("body", "there".to_string())],
        )
        .unwrap();
        assert_eq!(out, "# Hi\nthere!");
    }

    #[test]
    fn substitute_rejects_unknown_placeholder() {
        let err = substitute("index.md", "{{title}} {{oops}}", &[("title", String::new())])
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownPlaceholder { ref name, .. } if name == "oops"));
        assert_eq!(err.to_string(), "unknown placeholder '{{oops}}' in template index.md");
    }

    #[test]
    fn strip_outer_paragraph_tags_only_strips_outer() {
        assert_eq!(strip_outer_paragraph_tags("<p>one</p>"), "one");
        assert_eq!(
            strip_outer_paragraph_tags("<p>one</p><p>two</p>"),
            "one</p><p>two"
        );
        assert_eq!(strip_outer_paragraph_tags("plain"), "plain");
    }

    // ========================================================================
    // Templates
    // ========================================================================

    #[test]
    fn builtin_templates_use_known_placeholders() {
        let templates = Templates::builtin();
        check_placeholders(CLASS_TEMPLATE, templates.class(), CLASS_PLACEHOLDERS).unwrap();
        check_placeholders(INDEX_TEMPLATE, templates.index(), INDEX_PLACEHOLDERS).unwrap();
    }

    #[test]
    fn load_missing_template_is_not_found() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(INDEX_TEMPLATE), "{{index}}").unwrap();
        let err = Templates::load(dir.path()).unwrap_err();
        match err {
            RenderError::TemplateNotFound { path } => {
                assert_eq!(path, dir.path().join(CLASS_TEMPLATE))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_rejects_unknown_placeholder() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CLASS_TEMPLATE), "{{name}} {{author}}").unwrap();
        fs::write(dir.path().join(INDEX_TEMPLATE), "{{index}}").unwrap();
        assert!(matches!(
            Templates::load(dir.path()),
            Err(RenderError::UnknownPlaceholder { .. })
        ));
    }

    #[test]
    fn custom_templates_are_used() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CLASS_TEMPLATE), "{{kind}} {{name}}\n").unwrap();
        fs::write(dir.path().join(INDEX_TEMPLATE), "{{title}}\n{{index}}").unwrap();
        let renderer = TemplateRenderer::new(Templates::from_dir(Some(dir.path())).unwrap());

        let table = fixture();
        let mut links = LinkResolver::new(&table, LinkMode::MultiDocument, DEFAULT_LINK_TEMPLATE);
        let entries = links.build_index();
        let ctx = RenderContext {
            table: &table,
            links: &links,
        };
        let timer = table.get("Acme\\Timer").unwrap();
        assert_eq!(renderer.render_class(timer, &ctx).unwrap(), "class Acme\\Timer\n");
        assert!(renderer
            .render_index("T", &entries)
            .unwrap()
            .starts_with("T\n* [Timer](Acme-Timer.md#timer)\n"));
    }

    // ========================================================================
    // Class Sections
    // ========================================================================

    #[test]
    fn class_section_has_heading_descriptions_and_parents() {
        let out = render_timer(LinkMode::MultiDocument);
        assert!(out.starts_with("## Timer\n\nA timer.\n\nCounts ticks.\n\n* Full name: `Acme\\Timer`\n"));
        assert!(out.contains("* Parent class: [Acme\\Base](Acme-Base.md)\n"));
        assert!(out.contains("**See Also:**\n\n* https://example.com/timer - Docs\n"));
        assert!(out.contains("* `const MAX = 10`: Upper bound.\n"));
    }

    #[test]
    fn only_public_methods_get_headings() {
        let out = render_timer(LinkMode::MultiDocument);
        let headings: Vec<_> = out.lines().filter(|l| l.starts_with('#')).collect();
        assert_eq!(headings, vec!["## Timer", "### start", "### describe"]);
        assert!(out.contains("* `Timer::tick(  )` *(protected)*: One tick.\n"));
    }

    #[test]
    fn method_section_links_types_and_strips_paragraphs() {
        let out = render_timer(LinkMode::MultiDocument);
        assert!(out.contains("```php\nTimer::start( int $delay, Acme\\Base|null $base ): Timer\n```"));
        assert!(out.contains("| `$delay` | **int** | Delay in ms. |"));
        assert!(out.contains("| `$base` | **[Acme\\Base](Acme-Base.md)|null** |  |"));
        // Self returns are shortened to the class short name, which is not a table key.
        assert!(out.contains("**Return Value:**\n\nTimer - Fluent.\n"));
    }

    #[test]
    fn inherited_members_name_their_declarer() {
        let out = render_timer(LinkMode::MultiDocument);
        assert!(out.contains("* Inherited from [Base](Acme-Base.md)\n"));
        assert!(out.contains("<p>Describe the thing.</p>\n\n```php\nTimer::describe(  ): string\n```"));
        assert!(out.contains("* `protected int $id` (inherited from [Base](Acme-Base.md))\n"));
        assert!(!out.contains("$secret"));
    }

    #[test]
    fn single_document_links_are_anchors() {
        let out = render_timer(LinkMode::SingleDocument);
        assert!(!out.contains(".md"));
        // Base is abstract and has no index anchor.
        assert!(out.contains("* Parent class: [Acme\\Base](#base)\n"));
    }

    #[test]
    fn deprecated_markers() {
        let table = resolved(json!([
            {"kind": "class", "full_name": "Old", "deprecated": true,
             "methods": [{"name": "run", "deprecated": true}]}
        ]));
        let mut links = LinkResolver::new(&table, LinkMode::SingleDocument, DEFAULT_LINK_TEMPLATE);
        links.build_index();
        let ctx = RenderContext {
            table: &table,
            links: &links,
        };
        let out = TemplateRenderer::default()
            .render_class(table.get("Old").unwrap(), &ctx)
            .unwrap();
        assert!(out.starts_with("## Old\n\n> **Deprecated**\n\n"));
        assert!(out.contains("### run\n\n> **Deprecated**\n\n"));
        assert!(out.contains("this method is **deprecated**"));
    }

    #[test]
    fn index_document() {
        let table = fixture();
        let mut links = LinkResolver::new(&table, LinkMode::SingleDocument, DEFAULT_LINK_TEMPLATE);
        let entries = links.build_index();
        let out = TemplateRenderer::default()
            .render_index("API Index", &entries)
            .unwrap();
        assert_eq!(
            out,
            "# API Index\n\n* [Timer](#timer)\n    * [start](#start)\n    * [describe](#describe)\n\n"
        );
    }
}
