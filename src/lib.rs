//! # ebook2txt
//!
//! Batch-convert PDF, EPUB and MOBI e-books to plain UTF-8 text.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input/
//!  │
//!  ├─ 1. Enumerate  regular files, sorted by name; classify by extension
//!  ├─ 2. Extract    pdf → pdfium text layer
//!  │                epub → body text of each content document
//!  │                mobi → body text of the decoded book
//!  │                (blocking pool, one file at a time)
//!  ├─ 3. Write      output/<stem>.txt (temp file + rename)
//!  └─ 4. Journal    "<file name>: <reason>" appended on any failure
//! ```
//!
//! A failing file never stops the batch; it gets one line in
//! `conversion_errors.log` and the next file is processed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ebook2txt::{convert_directory, BatchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig::builder()
//!         .input_dir("books")
//!         .output_dir("books-txt")
//!         .build()?;
//!     let report = convert_directory(&config).await?;
//!     eprintln!("{}/{} converted", report.succeeded(), report.total());
//!     Ok(())
//! }
//! ```
//!
//! ## EPUB → PDF
//!
//! [`bridge::RenderBridge`] drives Calibre's `ebook-convert` for the
//! separate EPUB-to-PDF batch ([`bridge::render_directory`]).
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ebook2txt` and `epub2pdf` binaries (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! ebook2txt = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! PDF extraction binds the pdfium shared library on first use. Set
//! `PDFIUM_LIB_PATH` to the library (or its directory) when it is not on the
//! system library path. EPUB and MOBI conversion never need it.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod bridge;
pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod format;
pub mod journal;
pub mod output;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::BatchDispatcher;
pub use bridge::{render_directory, RenderBridge, RenderFailure, RenderSummary};
pub use config::{BatchConfig, BatchConfigBuilder, PageSeparator};
pub use convert::{convert_bytes, convert_directory, convert_directory_sync, convert_file, inspect_pdf};
pub use error::{Ebook2TxtError, ItemError};
pub use extract::{Extractor, ExtractorSet};
pub use format::{DocumentFormat, SourceDocument};
pub use journal::{ErrorJournal, FileJournal, JournalEntry, MemoryJournal};
pub use output::{BatchReport, ConversionOutcome, DocumentMetadata};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
