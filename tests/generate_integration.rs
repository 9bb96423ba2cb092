//! Integration tests for the generation pipeline.
//!
//! These run the full load → resolve → render → write pipeline against
//! `tests/fixtures/acme.json` in a temporary output directory.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use apidoc_md::error::ApidocError;
use apidoc_md::generator::{Generator, GeneratorOptions};
use apidoc_md::link::LinkMode;
use apidoc_md::loader::JsonMetadataLoader;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn options(out: &Path, single_file: bool) -> GeneratorOptions {
    GeneratorOptions {
        output_dir: out.to_path_buf(),
        single_file,
        ..Default::default()
    }
}

// ============================================================================
// Single-Document Mode
// ============================================================================

#[test]
fn single_document_aggregates_index_and_classes() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("docs");

    let generator = Generator::new(options(&out, true)).unwrap();
    let summary = generator
        .run(&JsonMetadataLoader::new(fixture("acme.json")))
        .unwrap();

    assert_eq!(summary.mode, LinkMode::SingleDocument);
    assert_eq!(summary.documents, vec![PathBuf::from("README.md")]);
    assert_eq!(summary.classes, 4);
    assert_eq!(summary.documented_classes, 2);

    let readme = fs::read_to_string(out.join("README.md")).unwrap();
    assert!(readme.starts_with("# API Index\n\n* [Counter](#counter)\n"));

    // Both classes inherit `reset`; the second occurrence is numbered.
    assert!(readme.contains("    * [reset](#reset)\n"));
    assert!(readme.contains("    * [reset](#reset-1)\n"));

    let counter = readme.find("## Counter").unwrap();
    let timer = readme.find("## Timer").unwrap();
    assert!(counter < timer);
}

#[test]
fn single_document_resolves_inherited_members() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("docs");
    Generator::new(options(&out, true))
        .unwrap()
        .run(&JsonMetadataLoader::new(fixture("acme.json")))
        .unwrap();
    let readme = fs::read_to_string(out.join("README.md")).unwrap();

    // Covariant self-return: Component::withName returns Component, so
    // Counter's copy returns Counter.
    assert!(readme.contains("Counter::withName( string $name ): Counter"));
    assert!(readme.contains("| `$name` | **string** | New name. |"));
    // Protected ancestor property is visible, private one is not.
    assert!(readme.contains("`protected string $name`"));
    assert!(!readme.contains("$registry"));
    // Union argument type: known class linked, null passed through.
    assert!(readme.contains("**[Acme\\Counter](#counter)|null**"));
    // Deprecated class marker.
    assert!(readme.contains("## Timer\n\n> **Deprecated**"));
}

// ============================================================================
// Multi-Document Mode
// ============================================================================

#[test]
fn multi_document_writes_one_file_per_concrete_class() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("docs");

    let summary = Generator::new(options(&out, false))
        .unwrap()
        .run(&JsonMetadataLoader::new(fixture("acme.json")))
        .unwrap();

    assert_eq!(
        summary.documents,
        vec![
            PathBuf::from("Acme-Counter.md"),
            PathBuf::from("Acme-Timer.md"),
            PathBuf::from("README.md"),
        ]
    );
    assert!(!out.join("Acme-Component.md").exists());
    assert!(!out.join("Acme-Resettable.md").exists());

    let index = fs::read_to_string(out.join("README.md")).unwrap();
    assert!(index.contains("* [Counter](Acme-Counter.md#counter)\n"));
    assert!(index.contains("    * [reset](Acme-Timer.md#reset)\n"));
    assert!(!index.contains("## Counter"));

    let counter = fs::read_to_string(out.join("Acme-Counter.md")).unwrap();
    assert!(counter.starts_with("## Counter\n"));
    assert!(counter.contains("* Parent class: [Acme\\Component](Acme-Component.md)\n"));
}

#[test]
fn custom_title_and_index_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("docs");
    let generator = Generator::new(GeneratorOptions {
        title: "Acme API".to_string(),
        index_file: "index.md".to_string(),
        ..options(&out, true)
    })
    .unwrap();
    generator
        .run(&JsonMetadataLoader::new(fixture("acme.json")))
        .unwrap();

    assert!(!out.join("README.md").exists());
    let index = fs::read_to_string(out.join("index.md")).unwrap();
    assert!(index.starts_with("# Acme API\n"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn missing_input_is_a_load_error_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("docs");
    let err = Generator::new(options(&out, true))
        .unwrap()
        .run(&JsonMetadataLoader::new(dir.path().join("missing.json")))
        .unwrap_err();

    assert!(matches!(err, ApidocError::Load(_)));
    assert!(!out.exists());
}

#[test]
fn incomplete_template_dir_leaves_output_untouched() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("docs");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("README.md"), "previous run").unwrap();

    let templates = dir.path().join("templates");
    fs::create_dir_all(&templates).unwrap();
    fs::write(templates.join("index.md"), "# {{title}}\n{{index}}").unwrap();

    let err = Generator::new(GeneratorOptions {
        template_dir: Some(templates),
        ..options(&out, true)
    })
    .unwrap_err();

    assert!(matches!(err, ApidocError::Render(_)));
    assert_eq!(
        fs::read_to_string(out.join("README.md")).unwrap(),
        "previous run"
    );
}

#[test]
fn rerun_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("docs");
    let generator = Generator::new(options(&out, true)).unwrap();
    let loader = JsonMetadataLoader::new(fixture("acme.json"));

    generator.run(&loader).unwrap();
    let first = fs::read(out.join("README.md")).unwrap();
    generator.run(&loader).unwrap();
    let second = fs::read(out.join("README.md")).unwrap();
    assert_eq!(first, second);
}
