//! Format extractors: one input file in, one text string out.
//!
//! Each submodule handles exactly one format. Extractors are stateless and
//! synchronous; the batch dispatcher runs them on tokio's blocking pool.
//!
//! ## Data Flow
//!
//! ```text
//! .pdf  ──▶ pdf   (pdfium text layer, pages joined)
//! .epub ──▶ epub  (zip + OPF manifest) ──▶ html (body text per document)
//! .mobi ──▶ mobi  (PalmDB records)     ──▶ html (body text of the book)
//! ```
//!
//! 1. [`pdf`]: page text in reading order; the engine binds once per process
//! 2. [`epub`]: content documents in manifest order, unreadable ones skipped
//! 3. [`mobi`]: decompressed Kindle HTML
//! 4. [`html`]: shared markup-to-text step

pub mod epub;
pub mod html;
pub mod mobi;
pub mod pdf;

use crate::config::BatchConfig;
use crate::error::Ebook2TxtError;
use crate::format::DocumentFormat;
use std::path::Path;
use std::sync::Arc;

pub use self::epub::EpubExtractor;
pub use self::mobi::MobiExtractor;
pub use self::pdf::PdfExtractor;

/// Turns one e-book file into plain text.
pub trait Extractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, Ebook2TxtError>;
}

/// The extractor used for each supported format.
#[derive(Clone)]
pub struct ExtractorSet {
    pdf: Arc<dyn Extractor>,
    epub: Arc<dyn Extractor>,
    mobi: Arc<dyn Extractor>,
}

impl ExtractorSet {
    /// pdfium, zip-container EPUB and `mobi`-crate extractors.
    pub fn standard(config: &BatchConfig) -> Self {
        Self {
            pdf: Arc::new(PdfExtractor::from_config(config)),
            epub: Arc::new(EpubExtractor::new()),
            mobi: Arc::new(MobiExtractor),
        }
    }

    pub fn with_pdf(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.pdf = extractor;
        self
    }

    pub fn with_epub(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.epub = extractor;
        self
    }

    pub fn with_mobi(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.mobi = extractor;
        self
    }

    /// The extractor for `format`, or `None` for [`DocumentFormat::Unknown`].
    pub fn for_format(&self, format: DocumentFormat) -> Option<Arc<dyn Extractor>> {
        match format {
            DocumentFormat::Pdf => Some(Arc::clone(&self.pdf)),
            DocumentFormat::Epub => Some(Arc::clone(&self.epub)),
            DocumentFormat::Mobi => Some(Arc::clone(&self.mobi)),
            DocumentFormat::Unknown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl Extractor for Fixed {
        fn extract(&self, _path: &Path) -> Result<String, Ebook2TxtError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn routes_by_format() {
        let set = ExtractorSet::standard(&BatchConfig::default())
            .with_pdf(Arc::new(Fixed("pdf")))
            .with_epub(Arc::new(Fixed("epub")))
            .with_mobi(Arc::new(Fixed("mobi")));

        let run = |format| {
            set.for_format(format)
                .map(|e| e.extract(Path::new("x")).unwrap())
        };
        assert_eq!(run(DocumentFormat::Pdf).as_deref(), Some("pdf"));
        assert_eq!(run(DocumentFormat::Epub).as_deref(), Some("epub"));
        assert_eq!(run(DocumentFormat::Mobi).as_deref(), Some("mobi"));
        assert!(set.for_format(DocumentFormat::Unknown).is_none());
    }
}
