//! Source discovery: list an input directory and classify each file.
//!
//! Classification is by lowercased extension only. Content sniffing happens
//! later, inside the extractor that owns the format (the PDF extractor looks
//! for a `%PDF-` header, the EPUB extractor fails on a non-zip container),
//! so a misnamed file fails with a format-specific reason instead of being
//! silently rerouted.

use crate::error::Ebook2TxtError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Formats the batch knows how to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat {
    Pdf,
    Epub,
    Mobi,
    /// Anything else; skipped by the dispatcher without an outcome.
    Unknown,
}

impl DocumentFormat {
    /// Classify a path by its lowercased extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("pdf") => DocumentFormat::Pdf,
            Some("epub") => DocumentFormat::Epub,
            Some("mobi") => DocumentFormat::Mobi,
            _ => DocumentFormat::Unknown,
        }
    }

    pub fn is_supported(self) -> bool {
        self != DocumentFormat::Unknown
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Epub => "EPUB",
            DocumentFormat::Mobi => "MOBI",
            DocumentFormat::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One file discovered in the input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    path: PathBuf,
    format: DocumentFormat,
    stem: String,
}

impl SourceDocument {
    /// Classify `path`. The stem is the file name without its last extension.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = DocumentFormat::from_path(&path);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, format, stem }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Original file name, as written to the journal.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// List the regular files directly inside `dir`, sorted by file name.
///
/// Directories and other non-files are skipped; symlinks are followed.
/// Unknown formats are included; callers filter on [`DocumentFormat`].
pub async fn list_sources(dir: &Path) -> Result<Vec<SourceDocument>, Ebook2TxtError> {
    let unreadable = |source| Ebook2TxtError::InputDirUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(unreadable)?;
    let mut sources = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        let path = entry.path();
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => sources.push(SourceDocument::new(path)),
            Ok(_) => debug!("Skipping non-file entry: {}", path.display()),
            Err(e) => debug!("Skipping unreadable entry {}: {}", path.display(), e),
        }
    }

    sources.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(sources)
}

/// Map a failure to open an input file onto the matching error variant.
pub(crate) fn open_error(path: &Path, error: &std::io::Error) -> Ebook2TxtError {
    match error.kind() {
        std::io::ErrorKind::PermissionDenied => Ebook2TxtError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Ebook2TxtError::FileNotFound {
            path: path.to_path_buf(),
        },
    }
}

/// Open `path` and return at most its first `limit` bytes.
pub fn read_head(path: &Path, limit: usize) -> Result<Vec<u8>, Ebook2TxtError> {
    let file = std::fs::File::open(path).map_err(|e| open_error(path, &e))?;

    let mut head = Vec::with_capacity(limit);
    file.take(limit as u64)
        .read_to_end(&mut head)
        .map_err(|e| open_error(path, &e))?;
    Ok(head)
}
