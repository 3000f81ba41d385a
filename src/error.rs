//! Error types for the ebook2txt library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Ebook2TxtError`]: **Fatal for one file**: the document cannot be
//!   converted at all (corrupt container, decode failure, no text found).
//!   The batch dispatcher records it in the error journal and moves on to the
//!   next file. A handful of variants (`InputDirUnreadable`,
//!   `OutputDirFailed`, `JournalWriteFailed`) stop the whole run instead.
//!
//! * [`ItemError`]: **Non-fatal**: a single EPUB content document could not
//!   be read, but the rest of the book is fine. The item is skipped with a
//!   warning and never reaches the journal on its own.
//!
//! Every `Display` rendering is a single line: the journal stores one failure
//! per line as `"<file name>: <reason>"`.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the ebook2txt library.
///
/// Per-item EPUB failures use [`ItemError`] and are skipped rather than
/// propagated here.
#[derive(Debug, Error)]
pub enum Ebook2TxtError {
    // ── Run-level errors ──────────────────────────────────────────────────
    /// The input directory is missing or cannot be listed.
    #[error("Cannot read input directory '{path}': {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output directory could not be created.
    #[error("Cannot create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Appending to the error journal failed (disk full, permissions).
    #[error("Failed to append to error journal '{path}': {source}")]
    JournalWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The extension is not one of `pdf`, `epub`, `mobi`.
    #[error("Unsupported file format: '{path}'")]
    UnsupportedFormat { path: PathBuf },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}' (first bytes: {magic:?})")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error("Failed to bind to pdfium library: {0} (set PDFIUM_LIB_PATH=/path/to/libpdfium)")]
    PdfEngineUnavailable(String),

    /// pdfium returned an error while reading the text layer of a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    // ── EPUB errors ───────────────────────────────────────────────────────
    /// The EPUB container itself could not be opened (not a zip, missing
    /// `container.xml`, unreadable OPF package).
    #[error("Failed to open EPUB '{path}': {detail}")]
    EpubOpenFailed { path: PathBuf, detail: String },

    /// A container opener does not understand one of the requested options.
    ///
    /// Signals the EPUB extractor to retry with default options.
    #[error("Unsupported EPUB open option: {0}")]
    UnsupportedOpenOption(String),

    /// Every content document was empty or unreadable.
    #[error("No text content found in EPUB file")]
    EpubNoText,

    // ── MOBI errors ───────────────────────────────────────────────────────
    /// The MOBI decoder rejected the file.
    #[error("MOBI decode failed: {detail}")]
    MobiDecodeFailed { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output text file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single EPUB content document.
///
/// The document is skipped; the book still converts as long as at least one
/// other document yields text.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ItemError {
    /// The manifest points at an entry the archive does not contain.
    #[error("Item '{href}': not present in archive")]
    MissingEntry { href: String },

    /// The archive entry exists but could not be read or inflated.
    #[error("Item '{href}': read failed: {detail}")]
    ReadFailed { href: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_text_message_matches_journal_format() {
        assert_eq!(
            Ebook2TxtError::EpubNoText.to_string(),
            "No text content found in EPUB file"
        );
    }

    #[test]
    fn fatal_errors_render_on_one_line() {
        let errors = [
            Ebook2TxtError::NotAPdf {
                path: "x.pdf".into(),
                magic: *b"PK\x03\x04",
            },
            Ebook2TxtError::PdfEngineUnavailable("no such file".into()),
            Ebook2TxtError::EpubOpenFailed {
                path: "b.epub".into(),
                detail: "invalid Zip archive".into(),
            },
            Ebook2TxtError::MobiDecodeFailed {
                path: "c.mobi".into(),
                detail: "bad header".into(),
            },
        ];
        for e in errors {
            let msg = e.to_string();
            assert!(!msg.contains('\n'), "multi-line message: {msg}");
        }
    }

    #[test]
    fn mobi_error_keeps_library_message() {
        let e = Ebook2TxtError::MobiDecodeFailed {
            path: "c.mobi".into(),
            detail: "invalid compression type".into(),
        };
        assert!(e.to_string().contains("invalid compression type"));
    }

    #[test]
    fn item_error_display() {
        let e = ItemError::ReadFailed {
            href: "OEBPS/ch1.xhtml".into(),
            detail: "corrupt deflate stream".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("ch1.xhtml"), "got: {msg}");
        assert!(msg.contains("corrupt deflate"), "got: {msg}");
    }
}
