//! Library entry points.
//!
//! [`convert_directory`] is the batch: it reads `config.input_dir`, writes
//! `<stem>.txt` files and journals failures. The single-document functions
//! ([`convert_file`], [`convert_bytes`], [`inspect_pdf`]) return their result
//! directly and write nothing.

use crate::batch::{extract_blocking, BatchDispatcher};
use crate::config::BatchConfig;
use crate::error::Ebook2TxtError;
use crate::extract::{ExtractorSet, PdfExtractor};
use crate::format::DocumentFormat;
use crate::output::{BatchReport, DocumentMetadata};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Convert every PDF, EPUB and MOBI file in `config.input_dir`.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(BatchReport)` whenever the batch ran to the end, even if some files
/// failed (check [`BatchReport::failed`] and the journal).
///
/// # Errors
/// Returns `Err(Ebook2TxtError)` only for run-level failures:
/// - input directory missing or unreadable
/// - output directory cannot be created
/// - the error journal cannot be appended to
pub async fn convert_directory(config: &BatchConfig) -> Result<BatchReport, Ebook2TxtError> {
    BatchDispatcher::new(config.clone()).run().await
}

/// Synchronous wrapper around [`convert_directory`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_directory_sync(config: &BatchConfig) -> Result<BatchReport, Ebook2TxtError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Ebook2TxtError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_directory(config))
}

/// Extract the text of one e-book without writing anything.
///
/// The format is chosen by extension, as in the batch.
pub async fn convert_file(
    path: impl AsRef<Path>,
    config: &BatchConfig,
) -> Result<String, Ebook2TxtError> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path);
    let extractor = ExtractorSet::standard(config)
        .for_format(format)
        .ok_or_else(|| Ebook2TxtError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;

    info!("Converting {} ({})", path.display(), format);
    extract_blocking(extractor, path).await
}

/// Extract the text of an in-memory e-book.
///
/// Internally the bytes are written to a managed [`tempfile`] carrying the
/// format's extension; it is removed on return.
pub async fn convert_bytes(
    bytes: &[u8],
    format: DocumentFormat,
    config: &BatchConfig,
) -> Result<String, Ebook2TxtError> {
    let suffix = match format {
        DocumentFormat::Pdf => ".pdf",
        DocumentFormat::Epub => ".epub",
        DocumentFormat::Mobi => ".mobi",
        DocumentFormat::Unknown => {
            return Err(Ebook2TxtError::InvalidConfig(
                "cannot convert bytes of unknown format".into(),
            ));
        }
    };

    let mut tmp = tempfile::Builder::new()
        .prefix("ebook2txt-")
        .suffix(suffix)
        .tempfile()
        .map_err(|e| Ebook2TxtError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Ebook2TxtError::Internal(format!("tempfile write: {e}")))?;
    // `tmp` is dropped (and the file deleted) when `convert_file` returns
    convert_file(tmp.path(), config).await
}

/// Read PDF metadata and page count, using the configured password.
pub async fn inspect_pdf(
    path: impl AsRef<Path>,
    config: &BatchConfig,
) -> Result<DocumentMetadata, Ebook2TxtError> {
    let path = path.as_ref().to_path_buf();
    let extractor = PdfExtractor::from_config(config);

    tokio::task::spawn_blocking(move || extractor.extract_with_metadata(&path))
        .await
        .map_err(|e| Ebook2TxtError::Internal(format!("Metadata task panicked: {}", e)))?
        .map(|(_, metadata)| metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_extension_rejected() {
        let err = convert_file("notes.txt", &BatchConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Ebook2TxtError::UnsupportedFormat { .. }));
    }

    #[tokio::test]
    async fn bytes_of_unknown_format_rejected() {
        let err = convert_bytes(b"hello", DocumentFormat::Unknown, &BatchConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Ebook2TxtError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn bytes_routed_by_format() {
        let err = convert_bytes(b"not a palm db", DocumentFormat::Mobi, &BatchConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Ebook2TxtError::MobiDecodeFailed { .. }));
    }

    #[test]
    fn sync_wrapper_reports_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = BatchConfig::builder()
            .input_dir(dir.path().join("absent"))
            .output_dir(dir.path().join("out"))
            .journal_path(dir.path().join("errors.log"))
            .build()
            .unwrap();
        let err = convert_directory_sync(&config).unwrap_err();
        assert!(matches!(err, Ebook2TxtError::InputDirUnreadable { .. }));
    }
}
