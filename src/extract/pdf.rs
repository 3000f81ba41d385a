//! PDF text extraction via pdfium.
//!
//! ## Engine lifetime
//!
//! Binding pdfium loads a shared library, so it happens once per process:
//! [`PdfiumEngine::shared`] binds on first use and keeps the engine in a
//! static `OnceCell`. A failed bind leaves the cell empty; the next PDF
//! tries again.
//!
//! ## Layout vs. text
//!
//! The engine produces a [`RenderedDocument`] (per-page text, image counts,
//! document metadata). [`text_from_rendered`] turns that into the final
//! text, so page assembly is testable without a pdfium binary.

use crate::config::{BatchConfig, PageSeparator};
use crate::error::Ebook2TxtError;
use crate::extract::Extractor;
use crate::format::read_head;
use crate::output::DocumentMetadata;
use once_cell::sync::OnceCell;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// A `%PDF-` header anywhere in the first KiB, as PDF readers accept it.
const PDF_HEADER: &[u8] = b"%PDF-";
const HEADER_SCAN_LEN: usize = 1024;

/// One page of a laid-out PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPage {
    /// 0-based page index.
    pub index: usize,
    /// Text layer in reading order.
    pub text: String,
    /// Number of image objects on the page.
    pub image_count: usize,
}

/// Output of a [`LayoutEngine`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDocument {
    pub pages: Vec<RenderedPage>,
    pub metadata: DocumentMetadata,
}

/// Lays out a PDF and reads its text layer.
pub trait LayoutEngine: Send + Sync {
    fn render(&self, path: &Path, password: Option<&str>)
        -> Result<RenderedDocument, Ebook2TxtError>;
}

/// Assemble page texts into one string.
///
/// Pages are joined with `separator` in page order. Line endings are
/// normalised to `\n`. Returns the text, the document metadata and the total
/// number of images seen.
pub fn text_from_rendered(
    rendered: &RenderedDocument,
    separator: &PageSeparator,
) -> (String, DocumentMetadata, usize) {
    let sep = separator.render();
    let text = rendered
        .pages
        .iter()
        .map(|page| page.text.replace("\r\n", "\n").replace('\r', "\n"))
        .collect::<Vec<_>>()
        .join(&sep);
    let images = rendered.pages.iter().map(|page| page.image_count).sum();

    (text, rendered.metadata.clone(), images)
}

// ── pdfium ───────────────────────────────────────────────────────────────

static ENGINE: OnceCell<PdfiumEngine> = OnceCell::new();

/// The process-wide pdfium binding.
pub struct PdfiumEngine {
    pdfium: Pdfium,
}

impl PdfiumEngine {
    /// Bind pdfium on first call and return the shared engine.
    ///
    /// Looks at `PDFIUM_LIB_PATH` (a library file or the directory holding
    /// it) first, then the system library path.
    pub fn shared() -> Result<&'static PdfiumEngine, Ebook2TxtError> {
        ENGINE.get_or_try_init(|| {
            let bindings = bind_library()?;
            info!("pdfium engine loaded");
            Ok(PdfiumEngine {
                pdfium: Pdfium::new(bindings),
            })
        })
    }
}

fn bind_library() -> Result<Box<dyn PdfiumLibraryBindings>, Ebook2TxtError> {
    if let Ok(configured) = std::env::var("PDFIUM_LIB_PATH") {
        let configured = PathBuf::from(configured);
        let library = if configured.is_dir() {
            PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(&configured))
        } else {
            configured
        };
        debug!("Binding pdfium from {}", library.display());
        return Pdfium::bind_to_library(&library).map_err(|e| {
            Ebook2TxtError::PdfEngineUnavailable(format!("{}: {}", library.display(), e))
        });
    }

    Pdfium::bind_to_system_library()
        .map_err(|e| Ebook2TxtError::PdfEngineUnavailable(e.to_string()))
}

impl LayoutEngine for PdfiumEngine {
    fn render(
        &self,
        path: &Path,
        password: Option<&str>,
    ) -> Result<RenderedDocument, Ebook2TxtError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| load_error(path, password, e))?;

        let pages = document.pages();
        let page_count = pages.len() as usize;
        debug!("PDF loaded: {} pages", page_count);

        let mut rendered = Vec::with_capacity(page_count);
        for (index, page) in pages.iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| Ebook2TxtError::TextExtractionFailed {
                    page: index + 1,
                    detail: format!("{:?}", e),
                })?
                .all();
            let image_count = page
                .objects()
                .iter()
                .filter(|object| matches!(object.object_type(), PdfPageObjectType::Image))
                .count();

            rendered.push(RenderedPage {
                index,
                text,
                image_count,
            });
        }

        Ok(RenderedDocument {
            pages: rendered,
            metadata: document_metadata(&document, page_count),
        })
    }
}

fn load_error(path: &Path, password: Option<&str>, error: PdfiumError) -> Ebook2TxtError {
    let detail = format!("{:?}", error);
    if detail.contains("Password") || detail.contains("password") {
        if password.is_some() {
            Ebook2TxtError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            Ebook2TxtError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        Ebook2TxtError::CorruptPdf {
            path: path.to_path_buf(),
            detail,
        }
    }
}

fn document_metadata(document: &PdfDocument<'_>, page_count: usize) -> DocumentMetadata {
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count,
        pdf_version: format!("{:?}", document.version()),
    }
}

// ── Extractor ────────────────────────────────────────────────────────────

/// Extracts the text layer of every page.
#[derive(Clone, Default)]
pub struct PdfExtractor {
    /// `None` uses the shared pdfium engine.
    engine: Option<Arc<dyn LayoutEngine>>,
    password: Option<String>,
    separator: PageSeparator,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the password and page separator from a batch configuration.
    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            engine: None,
            password: config.password.clone(),
            separator: config.page_separator.clone(),
        }
    }

    pub fn with_engine(mut self, engine: Arc<dyn LayoutEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_separator(mut self, separator: PageSeparator) -> Self {
        self.separator = separator;
        self
    }

    /// Lay out `path` and return its text together with document metadata.
    pub fn extract_with_metadata(
        &self,
        path: &Path,
    ) -> Result<(String, DocumentMetadata), Ebook2TxtError> {
        let head = read_head(path, HEADER_SCAN_LEN)?;
        if !head.windows(PDF_HEADER.len()).any(|w| w == PDF_HEADER) {
            let mut magic = [0u8; 4];
            let n = head.len().min(magic.len());
            magic[..n].copy_from_slice(&head[..n]);
            return Err(Ebook2TxtError::NotAPdf {
                path: path.to_path_buf(),
                magic,
            });
        }

        let rendered = match &self.engine {
            Some(engine) => engine.render(path, self.password.as_deref())?,
            None => PdfiumEngine::shared()?.render(path, self.password.as_deref())?,
        };

        let (text, metadata, images) = text_from_rendered(&rendered, &self.separator);
        info!(
            "Extracted {} pages ({} images, {} chars) from {}",
            metadata.page_count,
            images,
            text.chars().count(),
            path.display()
        );
        Ok((text, metadata))
    }
}

impl Extractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String, Ebook2TxtError> {
        self.extract_with_metadata(path).map(|(text, _)| text)
    }
}
