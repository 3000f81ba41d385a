//! Integration tests for the directory batch.
//!
//! EPUB fixtures are built on the fly with `zip`; PDF conversion is replaced
//! by an in-process extractor so these tests never need the pdfium library.

mod common;

use common::{mobi_bytes, write_epub, Chapter, Workspace};
use ebook2txt::extract::epub::{
    ContainerOpener, EpubContainer, EpubExtractor, OpenOptions, ZipContainerOpener,
};
use ebook2txt::{
    convert_directory, BatchConfig, BatchDispatcher, ConversionProgressCallback, Ebook2TxtError,
    Extractor, ExtractorSet, FileJournal,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn config_for(ws: &Workspace) -> BatchConfig {
    BatchConfig::builder()
        .input_dir(&ws.input)
        .output_dir(&ws.output)
        .journal_path(&ws.journal)
        .build()
        .expect("valid config")
}

/// Stands in for pdfium: returns the text the test asks for.
struct FakePdf(&'static str);

impl Extractor for FakePdf {
    fn extract(&self, _path: &Path) -> Result<String, Ebook2TxtError> {
        Ok(self.0.to_string())
    }
}

fn dispatcher_with_fake_pdf(ws: &Workspace, text: &'static str) -> BatchDispatcher {
    let config = config_for(ws);
    let extractors = ExtractorSet::standard(&config).with_pdf(Arc::new(FakePdf(text)));
    let journal = FileJournal::new(&ws.journal);
    BatchDispatcher::with_parts(config, extractors, journal)
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn epub_chapters_joined_by_blank_line() {
    let ws = Workspace::new();
    write_epub(
        &ws.input.join("a.epub"),
        &[
            Chapter::new("ch1.xhtml", "<p>Hello</p>"),
            Chapter::new("ch2.xhtml", "<p>World</p>"),
        ],
    );

    let report = convert_directory(&config_for(&ws)).await.unwrap();

    assert_eq!(report.total(), 1);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(ws.read_output("a.txt"), "Hello\n\nWorld");
    assert!(ws.journal_lines().is_empty());
}

#[tokio::test]
async fn epub_without_text_is_journaled() {
    let ws = Workspace::new();
    write_epub(
        &ws.input.join("b.epub"),
        &[Chapter::new("ch1.xhtml", ""), Chapter::new("ch2.xhtml", "  \n ")],
    );

    let report = convert_directory(&config_for(&ws)).await.unwrap();

    assert_eq!(report.failed(), 1);
    assert!(!ws.output.join("b.txt").exists());
    assert_eq!(
        ws.journal_lines(),
        vec!["b.epub: No text content found in EPUB file".to_string()]
    );
}

#[tokio::test]
async fn pdf_converted_and_other_files_ignored() {
    let ws = Workspace::new();
    std::fs::write(ws.input.join("c.pdf"), b"%PDF-1.7\n").unwrap();
    std::fs::write(ws.input.join("d.txt"), b"notes").unwrap();

    let mut batch = dispatcher_with_fake_pdf(&ws, "Page one\n\nPage two");
    let report = batch.run().await.unwrap();

    assert_eq!(report.total(), 1);
    assert!(report.outcome("d.txt").is_none());
    assert_eq!(ws.read_output("c.txt"), "Page one\n\nPage two");
    assert!(!ws.output.join("d.txt").exists());
}

#[tokio::test]
async fn mobi_converted_to_txt() {
    let ws = Workspace::new();
    let html = "<html><head><guide></guide></head>\
                <body><p>It was a dark night.</p><p>The end</p></body></html>";
    std::fs::write(ws.input.join("x.mobi"), mobi_bytes("Night", html)).unwrap();

    let report = convert_directory(&config_for(&ws)).await.unwrap();

    assert_eq!(report.total(), 1);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(ws.read_output("x.txt"), "It was a dark night.\nThe end");
    assert!(ws.journal_lines().is_empty());
}

#[tokio::test]
async fn one_outcome_per_supported_file() {
    let ws = Workspace::new();
    write_epub(&ws.input.join("good.epub"), &[Chapter::new("c.xhtml", "<p>ok</p>")]);
    std::fs::write(ws.input.join("broken.epub"), b"not a zip").unwrap();
    std::fs::write(ws.input.join("junk.mobi"), b"not a palm database").unwrap();
    std::fs::write(ws.input.join("scan.PDF"), b"%PDF-1.4\n").unwrap();
    std::fs::write(ws.input.join("readme.md"), b"# hi").unwrap();

    let mut batch = dispatcher_with_fake_pdf(&ws, "scanned");
    let report = batch.run().await.unwrap();

    assert_eq!(report.total(), 4);
    assert_eq!(report.succeeded(), 2);

    let names: Vec<&str> = report.outcomes.iter().map(|o| o.file_name.as_str()).collect();
    assert_eq!(names, vec!["broken.epub", "good.epub", "junk.mobi", "scan.PDF"]);

    let journal = ws.journal_lines();
    assert_eq!(journal.len(), 2);
    assert!(journal[0].starts_with("broken.epub: "), "{journal:?}");
    assert!(journal[1].starts_with("junk.mobi: "), "{journal:?}");
    assert_eq!(ws.read_output("scan.txt"), "scanned");
}

#[tokio::test]
async fn unreadable_chapter_is_skipped() {
    let ws = Workspace::new();
    write_epub(
        &ws.input.join("partial.epub"),
        &[
            Chapter::new("ch1.xhtml", "<p>First</p>"),
            Chapter::missing("ch2.xhtml"),
            Chapter::new("ch3.xhtml", "<p>Third</p>"),
        ],
    );

    let report = convert_directory(&config_for(&ws)).await.unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(ws.read_output("partial.txt"), "First\n\nThird");
    assert!(ws.journal_lines().is_empty());
}

/// An opener that rejects `ignore_ncx`, counting its calls.
#[derive(Default)]
struct RejectingOpener {
    calls: Mutex<Vec<OpenOptions>>,
}

impl ContainerOpener for RejectingOpener {
    fn open(&self, path: &Path, options: OpenOptions) -> Result<EpubContainer, Ebook2TxtError> {
        self.calls.lock().unwrap().push(options);
        if options.ignore_ncx {
            return Err(Ebook2TxtError::UnsupportedOpenOption("ignore_ncx".into()));
        }
        ZipContainerOpener.open(path, options)
    }
}

#[tokio::test]
async fn opener_without_ignore_ncx_falls_back() {
    let ws = Workspace::new();
    write_epub(
        &ws.input.join("old.epub"),
        &[Chapter::new("ch1.xhtml", "<p>Still works</p>")],
    );

    let opener = Arc::new(RejectingOpener::default());
    let config = config_for(&ws);
    let extractors = ExtractorSet::standard(&config)
        .with_epub(Arc::new(EpubExtractor::with_opener(opener.clone())));
    let mut batch = BatchDispatcher::with_parts(config, extractors, FileJournal::new(&ws.journal));

    let report = batch.run().await.unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(ws.read_output("old.txt"), "Still works");
    assert_eq!(
        *opener.calls.lock().unwrap(),
        vec![OpenOptions { ignore_ncx: true }, OpenOptions::default()]
    );
}

#[tokio::test]
async fn rerun_overwrites_outputs_and_appends_journal() {
    let ws = Workspace::new();
    write_epub(&ws.input.join("a.epub"), &[Chapter::new("c.xhtml", "<p>v1</p>")]);
    std::fs::write(ws.input.join("bad.epub"), b"garbage").unwrap();

    convert_directory(&config_for(&ws)).await.unwrap();
    assert_eq!(ws.read_output("a.txt"), "v1");

    write_epub(&ws.input.join("a.epub"), &[Chapter::new("c.xhtml", "<p>v2</p>")]);
    convert_directory(&config_for(&ws)).await.unwrap();

    assert_eq!(ws.read_output("a.txt"), "v2");
    let journal = ws.journal_lines();
    assert_eq!(journal.len(), 2);
    assert_eq!(journal[0], journal[1]);
    assert!(journal[0].starts_with("bad.epub: "));
}

#[tokio::test]
async fn missing_input_dir_is_a_run_error() {
    let ws = Workspace::new();
    let config = BatchConfig::builder()
        .input_dir(ws.root.path().join("nowhere"))
        .output_dir(&ws.output)
        .journal_path(&ws.journal)
        .build()
        .unwrap();

    let err = convert_directory(&config).await.unwrap_err();
    assert!(matches!(err, Ebook2TxtError::InputDirUnreadable { .. }));
    assert!(!ws.journal.exists());
}

// ── Progress ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    started: AtomicUsize,
    completed: AtomicUsize,
    errors: Mutex<Vec<String>>,
    batch: Mutex<Option<(usize, usize)>>,
}

impl ConversionProgressCallback for Recorder {
    fn on_file_start(&self, _file_name: &str, _index: usize, _total: usize) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_file_complete(&self, _file_name: &str, _index: usize, _total: usize, _chars: usize) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_file_error(&self, file_name: &str, _index: usize, _total: usize, _error: &str) {
        self.errors.lock().unwrap().push(file_name.to_string());
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        *self.batch.lock().unwrap() = Some((total_files, success_count));
    }
}

#[tokio::test]
async fn progress_callback_sees_every_file() {
    let ws = Workspace::new();
    write_epub(&ws.input.join("a.epub"), &[Chapter::new("c.xhtml", "<p>A</p>")]);
    write_epub(&ws.input.join("b.epub"), &[Chapter::new("c.xhtml", "<p>B</p>")]);
    std::fs::write(ws.input.join("c.mobi"), b"nope").unwrap();

    let recorder = Arc::new(Recorder::default());
    let config = BatchConfig::builder()
        .input_dir(&ws.input)
        .output_dir(&ws.output)
        .journal_path(&ws.journal)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    convert_directory(&config).await.unwrap();

    assert_eq!(recorder.started.load(Ordering::SeqCst), 3);
    assert_eq!(recorder.completed.load(Ordering::SeqCst), 2);
    assert_eq!(*recorder.errors.lock().unwrap(), vec!["c.mobi".to_string()]);
    assert_eq!(*recorder.batch.lock().unwrap(), Some((3, 2)));
}
