//! Generation pipeline.
//!
//! ```text
//! MetadataLoader ─► SymbolTable::build ─► resolve ─► LinkResolver::build_index
//!                                                          │
//!                        write all ◄── render all ◄────────┘
//! ```
//!
//! Every document is rendered in memory before the first byte is written, so
//! a rendering failure leaves the output directory untouched. Each document
//! is then written atomically.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use apidoc_core::link::{LinkMode, LinkResolver, DEFAULT_LINK_TEMPLATE};
use apidoc_core::loader::MetadataLoader;
use apidoc_core::resolve::resolve;
use apidoc_core::symbols::SymbolTable;

use crate::config::{ResolvedConfig, DEFAULT_INDEX_FILE, DEFAULT_OUTPUT_DIR, DEFAULT_TITLE};
use crate::error::{ApidocError, ApidocResult};
use crate::render::{DocumentRenderer, RenderContext, TemplateRenderer, Templates};

// ============================================================================
// Options
// ============================================================================

/// Settings for one generator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub output_dir: PathBuf,
    /// `None` selects the built-in templates.
    pub template_dir: Option<PathBuf>,
    pub link_template: String,
    pub title: String,
    pub single_file: bool,
    pub index_file: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            template_dir: None,
            link_template: DEFAULT_LINK_TEMPLATE.to_string(),
            title: DEFAULT_TITLE.to_string(),
            single_file: true,
            index_file: DEFAULT_INDEX_FILE.to_string(),
        }
    }
}

impl GeneratorOptions {
    pub fn from_config(config: &ResolvedConfig) -> Self {
        GeneratorOptions {
            output_dir: config.output_dir.value.clone(),
            template_dir: config.template_dir.value.clone(),
            link_template: config.link_template.value.clone(),
            title: config.title.value.clone(),
            single_file: config.single_file.value,
            index_file: config.index_file.value.clone(),
        }
    }

    pub fn mode(&self) -> LinkMode {
        if self.single_file {
            LinkMode::SingleDocument
        } else {
            LinkMode::MultiDocument
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// A rendered document, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path relative to the output directory.
    pub path: PathBuf,
    pub content: String,
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub mode: LinkMode,
    pub output_dir: PathBuf,
    /// Written documents, relative to `output_dir`, in write order.
    pub documents: Vec<PathBuf>,
    /// Classes and interfaces in the symbol table.
    pub classes: usize,
    /// Classes that got a section.
    pub documented_classes: usize,
    pub index_entries: usize,
}

// ============================================================================
// Generator
// ============================================================================

/// Runs the pipeline with a given renderer.
#[derive(Debug)]
pub struct Generator<R = TemplateRenderer> {
    options: GeneratorOptions,
    renderer: R,
}

impl Generator<TemplateRenderer> {
    /// Create a generator using the templates named by `options`.
    ///
    /// Templates are loaded here, so a missing template fails before any
    /// input is read or output written.
    pub fn new(options: GeneratorOptions) -> ApidocResult<Self> {
        let templates = Templates::from_dir(options.template_dir.as_deref())?;
        Ok(Generator::with_renderer(options, TemplateRenderer::new(templates)))
    }
}

impl<R: DocumentRenderer> Generator<R> {
    pub fn with_renderer(options: GeneratorOptions, renderer: R) -> Self {
        Generator { options, renderer }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Load, resolve, render and write.
    pub fn run(&self, loader: &dyn MetadataLoader) -> ApidocResult<GenerationSummary> {
        let records = loader.load()?;
        let table = SymbolTable::build(records)?;
        info!(classes = table.len(), "built symbol table");

        let resolved = resolve(&table);
        let (documents, index_entries) = self.render(&resolved)?;
        let written = self.write(&documents)?;

        let summary = GenerationSummary {
            mode: self.options.mode(),
            output_dir: self.options.output_dir.clone(),
            documents: written,
            classes: resolved.len(),
            documented_classes: resolved.iter().filter(|c| c.kind.is_documented()).count(),
            index_entries,
        };
        info!(
            documents = summary.documents.len(),
            output_dir = %summary.output_dir.display(),
            "generation complete"
        );
        Ok(summary)
    }

    /// Render every document for a resolved table.
    ///
    /// Returns the documents in write order (class documents first, then
    /// the index document) and the number of index entries.
    pub fn render(&self, table: &SymbolTable) -> ApidocResult<(Vec<Document>, usize)> {
        let mode = self.options.mode();
        let mut links = LinkResolver::new(table, mode, self.options.link_template.as_str());
        let entries = links.build_index();

        let ctx = RenderContext {
            table,
            links: &links,
        };
        let mut sections = Vec::new();
        for class in table.iter().filter(|c| c.kind.is_documented()) {
            sections.push((class, self.renderer.render_class(class, &ctx)?));
        }
        let index = self.renderer.render_index(&self.options.title, &entries)?;
        info!(
            sections = sections.len(),
            index_entries = entries.len(),
            ?mode,
            "rendered documents"
        );

        let index_path = PathBuf::from(&self.options.index_file);
        check_document_path(&index_path)?;
        let mut documents = Vec::new();
        match mode {
            LinkMode::SingleDocument => {
                let mut content = index;
                for (_, section) in sections {
                    content.push_str(&section);
                }
                documents.push(Document {
                    path: index_path,
                    content,
                });
            }
            LinkMode::MultiDocument => {
                let mut owners: HashMap<PathBuf, &str> = HashMap::new();
                for (class, section) in sections {
                    let path = PathBuf::from(links.document_name(&class.name));
                    check_document_path(&path)?;
                    let key = normalized(&path);
                    if key == normalized(&index_path) {
                        return Err(ApidocError::invalid_args(format!(
                            "document for {} collides with the index file {}",
                            class.name,
                            index_path.display()
                        )));
                    }
                    if let Some(previous) = owners.insert(key, &class.name) {
                        return Err(ApidocError::invalid_args(format!(
                            "documents for {} and {} both map to {}",
                            previous,
                            class.name,
                            path.display()
                        )));
                    }
                    documents.push(Document {
                        path,
                        content: section,
                    });
                }
                documents.push(Document {
                    path: index_path,
                    content: index,
                });
            }
        }
        Ok((documents, entries.len()))
    }

    /// Write documents under the output directory, creating it if needed.
    pub fn write(&self, documents: &[Document]) -> ApidocResult<Vec<PathBuf>> {
        let output_dir = &self.options.output_dir;
        fs::create_dir_all(output_dir).map_err(|e| ApidocError::write(output_dir, e))?;

        let mut written = Vec::with_capacity(documents.len());
        for document in documents {
            let path = output_dir.join(&document.path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| ApidocError::write(parent, e))?;
            }
            atomic_write(&path, document.content.as_bytes())
                .map_err(|e| ApidocError::write(&path, e))?;
            debug!(path = %path.display(), bytes = document.content.len(), "wrote document");
            written.push(document.path.clone());
        }
        Ok(written)
    }
}

/// Reject document paths that would land outside the output directory.
fn check_document_path(path: &Path) -> ApidocResult<()> {
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || path.as_os_str().is_empty() {
        return Err(ApidocError::invalid_args(format!(
            "document path is outside the output directory: {}",
            path.display()
        )));
    }
    Ok(())
}

/// `path` without `.` components, for comparing document names.
fn normalized(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Write content to a file atomically using temp + rename.
///
/// The temp file sits next to the target and is named with the PID and a
/// timestamp, so concurrent writers never share one.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let pid = std::process::id();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let temp_path = path.with_file_name(format!(
        ".{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        pid,
        timestamp
    ));
    fs::write(&temp_path, content)?;
    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    Ok(())
}
