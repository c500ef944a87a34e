//! Integration tests for the conversion shell.
//!
//! These tests exercise the orchestration layer against a mock engine, so
//! they run everywhere without a pdfium library: what matters here is the
//! skip/overwrite policy, lazy at-most-once engine construction, per-file
//! failure isolation, and the filesystem contract — not what the engine
//! does with the bytes.

use pdfmd::{
    ConversionEngine, ConvertProgressCallback, Converter, ConverterConfig, DocumentMetadata,
    EngineError, EngineFactory, PdfmdError, ProgressCallback, RenderedDocument, RenderedPage,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Engine that "renders" any document into predictable Markdown derived
/// from the file name.
struct MockEngine;

impl ConversionEngine for MockEngine {
    fn render(&self, source: &Path) -> Result<RenderedDocument, EngineError> {
        let stem = source.file_stem().unwrap().to_string_lossy().into_owned();
        Ok(RenderedDocument {
            pages: vec![RenderedPage {
                index: 0,
                markdown: format!("# {stem}\n\nrendered content"),
                images: Vec::new(),
            }],
            metadata: DocumentMetadata {
                page_count: 1,
                ..Default::default()
            },
        })
    }
}

/// Engine that fails for any file whose name contains "bad".
struct FlakyEngine;

impl ConversionEngine for FlakyEngine {
    fn render(&self, source: &Path) -> Result<RenderedDocument, EngineError> {
        if source.file_stem().is_some_and(|s| s == "bad") {
            return Err(EngineError::Other("simulated engine failure".into()));
        }
        MockEngine.render(source)
    }
}

fn expected_markdown(stem: &str) -> String {
    format!("# {stem}\n\nrendered content")
}

/// Factory that counts how many times it runs — the initialization hook
/// for the at-most-once construction assertions.
fn counting_factory(
    engine: Arc<dyn ConversionEngine>,
    constructions: Arc<AtomicUsize>,
) -> EngineFactory {
    Arc::new(move |_options| {
        constructions.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&engine))
    })
}

fn mock_converter() -> (Converter, Arc<AtomicUsize>) {
    let constructions = Arc::new(AtomicUsize::new(0));
    let converter = Converter::with_factory(
        ConverterConfig::default(),
        counting_factory(Arc::new(MockEngine), Arc::clone(&constructions)),
    );
    (converter, constructions)
}

fn write_stub_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.7 stub").unwrap();
    path
}

fn file_names(paths: &[PathBuf]) -> BTreeSet<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

// ── convert_single_file ──────────────────────────────────────────────────────

#[tokio::test]
async fn single_file_writes_engine_output() {
    let dir = tempdir().unwrap();
    let source = write_stub_pdf(dir.path(), "paper.pdf");

    let (converter, constructions) = mock_converter();
    let dest = converter.convert_single_file(&source, None).await.unwrap();

    // Default destination: same folder, extension swapped.
    assert_eq!(dest, dir.path().join("paper.md"));
    assert_eq!(
        std::fs::read_to_string(&dest).unwrap(),
        expected_markdown("paper")
    );
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn single_file_creates_missing_parent_directories() {
    let dir = tempdir().unwrap();
    let source = write_stub_pdf(dir.path(), "doc.pdf");
    let dest = dir.path().join("nested").join("deeper").join("doc.md");

    let (converter, _) = mock_converter();
    let written = converter
        .convert_single_file(&source, Some(&dest))
        .await
        .unwrap();

    assert_eq!(written, dest);
    assert_eq!(
        std::fs::read_to_string(&dest).unwrap(),
        expected_markdown("doc")
    );
}

#[tokio::test]
async fn single_file_missing_source_fails_before_engine_init() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.pdf");

    let (converter, constructions) = mock_converter();
    let result = converter.convert_single_file(&missing, None).await;

    let err = result.unwrap_err();
    assert!(matches!(err, PdfmdError::FileNotFound { .. }), "got: {err}");
    assert!(err.is_not_found());

    // Fail fast: no engine construction, no filesystem writes.
    assert_eq!(constructions.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn single_file_propagates_engine_error_unchanged() {
    let dir = tempdir().unwrap();
    let source = write_stub_pdf(dir.path(), "bad.pdf");
    let dest = dir.path().join("bad.md");

    let constructions = Arc::new(AtomicUsize::new(0));
    let converter = Converter::with_factory(
        ConverterConfig::default(),
        counting_factory(Arc::new(FlakyEngine), Arc::clone(&constructions)),
    );

    let err = converter
        .convert_single_file(&source, Some(&dest))
        .await
        .unwrap_err();

    assert!(matches!(err, PdfmdError::Engine { .. }), "got: {err}");
    assert!(err.to_string().contains("simulated engine failure"));
    assert!(!dest.exists(), "no destination may appear on failure");
}

#[tokio::test]
async fn engine_constructed_at_most_once_across_many_calls() {
    let dir = tempdir().unwrap();
    let (converter, constructions) = mock_converter();

    for name in ["a.pdf", "b.pdf", "c.pdf"] {
        let source = write_stub_pdf(dir.path(), name);
        converter.convert_single_file(&source, None).await.unwrap();
    }

    assert_eq!(constructions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn prebuilt_engine_bypasses_factory() {
    let dir = tempdir().unwrap();
    let source = write_stub_pdf(dir.path(), "shared.pdf");

    let config = ConverterConfig::builder()
        .engine(Arc::new(MockEngine) as Arc<dyn ConversionEngine>)
        .build()
        .unwrap();

    let constructions = Arc::new(AtomicUsize::new(0));
    let converter = Converter::with_factory(
        config,
        counting_factory(Arc::new(MockEngine), Arc::clone(&constructions)),
    );

    converter.convert_single_file(&source, None).await.unwrap();
    assert_eq!(constructions.load(Ordering::SeqCst), 0);
}

// ── convert_folder ───────────────────────────────────────────────────────────

#[tokio::test]
async fn folder_converts_matching_files_and_ignores_others() {
    let dir = tempdir().unwrap();
    let inputs = dir.path().join("inputs");
    let outputs = dir.path().join("outputs");
    std::fs::create_dir(&inputs).unwrap();

    write_stub_pdf(&inputs, "a.pdf");
    write_stub_pdf(&inputs, "b.pdf");
    std::fs::write(inputs.join("notes.txt"), "not a pdf").unwrap();

    let (converter, _) = mock_converter();
    let written = converter
        .convert_folder(&inputs, &outputs, false)
        .await
        .unwrap();

    // Enumeration order is filesystem-dependent: compare as sets.
    assert_eq!(written.len(), 2);
    assert_eq!(
        file_names(&written),
        BTreeSet::from(["a.md".to_string(), "b.md".to_string()])
    );

    assert!(outputs.is_dir());
    assert_eq!(
        std::fs::read_to_string(outputs.join("a.md")).unwrap(),
        expected_markdown("a")
    );
    assert_eq!(
        std::fs::read_to_string(outputs.join("b.md")).unwrap(),
        expected_markdown("b")
    );
    assert!(!outputs.join("notes.md").exists());
}

#[tokio::test]
async fn folder_missing_input_dir_fails_before_touching_output() {
    let dir = tempdir().unwrap();
    let inputs = dir.path().join("does-not-exist");
    let outputs = dir.path().join("outputs");

    let (converter, constructions) = mock_converter();
    let err = converter
        .convert_folder(&inputs, &outputs, false)
        .await
        .unwrap_err();

    assert!(
        matches!(err, PdfmdError::DirectoryNotFound { .. }),
        "got: {err}"
    );
    assert!(!outputs.exists(), "output dir must not be created");
    assert_eq!(constructions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn folder_with_no_matches_still_creates_output_dir() {
    let dir = tempdir().unwrap();
    let inputs = dir.path().join("inputs");
    let outputs = dir.path().join("outputs");
    std::fs::create_dir(&inputs).unwrap();
    std::fs::write(inputs.join("readme.txt"), "nothing to convert").unwrap();

    let (converter, constructions) = mock_converter();
    let written = converter
        .convert_folder(&inputs, &outputs, false)
        .await
        .unwrap();

    assert!(written.is_empty());
    assert!(outputs.is_dir());
    assert_eq!(constructions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn folder_skips_existing_destination_without_overwrite() {
    let dir = tempdir().unwrap();
    let inputs = dir.path().join("inputs");
    let outputs = dir.path().join("outputs");
    std::fs::create_dir(&inputs).unwrap();
    std::fs::create_dir(&outputs).unwrap();

    write_stub_pdf(&inputs, "a.pdf");
    write_stub_pdf(&inputs, "b.pdf");
    std::fs::write(outputs.join("a.md"), "pre-existing content").unwrap();

    let (converter, _) = mock_converter();
    let written = converter
        .convert_folder(&inputs, &outputs, false)
        .await
        .unwrap();

    // The skipped file is excluded from the result and left untouched,
    // byte for byte.
    assert_eq!(file_names(&written), BTreeSet::from(["b.md".to_string()]));
    assert_eq!(
        std::fs::read_to_string(outputs.join("a.md")).unwrap(),
        "pre-existing content"
    );
}

#[tokio::test]
async fn folder_overwrite_replaces_existing_destination() {
    let dir = tempdir().unwrap();
    let inputs = dir.path().join("inputs");
    let outputs = dir.path().join("outputs");
    std::fs::create_dir(&inputs).unwrap();
    std::fs::create_dir(&outputs).unwrap();

    write_stub_pdf(&inputs, "a.pdf");
    std::fs::write(outputs.join("a.md"), "stale content").unwrap();

    let (converter, _) = mock_converter();
    let written = converter
        .convert_folder(&inputs, &outputs, true)
        .await
        .unwrap();

    assert_eq!(file_names(&written), BTreeSet::from(["a.md".to_string()]));
    assert_eq!(
        std::fs::read_to_string(outputs.join("a.md")).unwrap(),
        expected_markdown("a")
    );
}

#[tokio::test]
async fn folder_continues_past_per_file_failure() {
    let dir = tempdir().unwrap();
    let inputs = dir.path().join("inputs");
    let outputs = dir.path().join("outputs");
    std::fs::create_dir(&inputs).unwrap();

    write_stub_pdf(&inputs, "bad.pdf");
    write_stub_pdf(&inputs, "good.pdf");

    let constructions = Arc::new(AtomicUsize::new(0));
    let converter = Converter::with_factory(
        ConverterConfig::default(),
        counting_factory(Arc::new(FlakyEngine), Arc::clone(&constructions)),
    );

    // The batch itself succeeds; only the failing member is dropped.
    let written = converter
        .convert_folder(&inputs, &outputs, false)
        .await
        .unwrap();

    assert_eq!(file_names(&written), BTreeSet::from(["good.md".to_string()]));
    assert!(!outputs.join("bad.md").exists());
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
}

// ── Progress events ──────────────────────────────────────────────────────────

struct CountingCallback {
    batch_total: AtomicUsize,
    started: AtomicUsize,
    completed: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
    batch_converted: AtomicUsize,
}

impl CountingCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            batch_total: AtomicUsize::new(0),
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            batch_converted: AtomicUsize::new(0),
        })
    }
}

impl ConvertProgressCallback for CountingCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.batch_total.store(total_files, Ordering::SeqCst);
    }
    fn on_file_start(&self, _name: &str, _index: usize, _total: usize) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }
    fn on_file_complete(&self, _name: &str, _index: usize, _total: usize, bytes: usize) {
        assert!(bytes > 0, "completed files report their written size");
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
    fn on_file_skipped(&self, _name: &str, _index: usize, _total: usize) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }
    fn on_file_error(&self, _name: &str, _index: usize, _total: usize, _error: String) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
    fn on_batch_complete(&self, _total_files: usize, converted: usize) {
        self.batch_converted.store(converted, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn folder_fires_progress_events_per_outcome() {
    let dir = tempdir().unwrap();
    let inputs = dir.path().join("inputs");
    let outputs = dir.path().join("outputs");
    std::fs::create_dir(&inputs).unwrap();
    std::fs::create_dir(&outputs).unwrap();

    write_stub_pdf(&inputs, "bad.pdf"); // will fail
    write_stub_pdf(&inputs, "good.pdf"); // will convert
    write_stub_pdf(&inputs, "seen.pdf"); // will be skipped
    std::fs::write(outputs.join("seen.md"), "already there").unwrap();

    let callback = CountingCallback::new();
    let config = ConverterConfig::builder()
        .progress_callback(Arc::clone(&callback) as ProgressCallback)
        .build()
        .unwrap();

    let constructions = Arc::new(AtomicUsize::new(0));
    let converter = Converter::with_factory(
        config,
        counting_factory(Arc::new(FlakyEngine), constructions),
    );

    let written = converter
        .convert_folder(&inputs, &outputs, false)
        .await
        .unwrap();

    assert_eq!(written.len(), 1);
    assert_eq!(callback.batch_total.load(Ordering::SeqCst), 3);
    // Skipped files never reach on_file_start.
    assert_eq!(callback.started.load(Ordering::SeqCst), 2);
    assert_eq!(callback.completed.load(Ordering::SeqCst), 1);
    assert_eq!(callback.skipped.load(Ordering::SeqCst), 1);
    assert_eq!(callback.failed.load(Ordering::SeqCst), 1);
    assert_eq!(callback.batch_converted.load(Ordering::SeqCst), 1);
}

// ── Custom extension ─────────────────────────────────────────────────────────

#[tokio::test]
async fn configured_extension_applies_to_derived_destinations() {
    let dir = tempdir().unwrap();
    let inputs = dir.path().join("inputs");
    let outputs = dir.path().join("outputs");
    std::fs::create_dir(&inputs).unwrap();
    write_stub_pdf(&inputs, "a.pdf");

    let config = ConverterConfig::builder()
        .markdown_extension("markdown")
        .build()
        .unwrap();
    let constructions = Arc::new(AtomicUsize::new(0));
    let converter =
        Converter::with_factory(config, counting_factory(Arc::new(MockEngine), constructions));

    let written = converter
        .convert_folder(&inputs, &outputs, false)
        .await
        .unwrap();

    assert_eq!(
        file_names(&written),
        BTreeSet::from(["a.markdown".to_string()])
    );
    assert!(outputs.join("a.markdown").exists());
}
