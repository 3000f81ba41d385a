//! MOBI text extraction via the `mobi` crate.
//!
//! The crate parses the PalmDB, MOBI and EXTH headers and decompresses the
//! text records (PalmDOC and HUFF/CDIC). What comes back is Kindle HTML,
//! which goes through the same body-text routine as EPUB documents.

use crate::error::Ebook2TxtError;
use crate::extract::{html, Extractor};
use crate::format::open_error;
use mobi::Mobi;
use std::path::Path;
use tracing::debug;

/// PalmDB type and creator of a MOBI book, at offset 60 of the header.
const PALMDB_SIGNATURE: &[u8] = b"BOOKMOBI";
const SIGNATURE_OFFSET: usize = 60;

#[derive(Debug, Clone, Copy, Default)]
pub struct MobiExtractor;

impl Extractor for MobiExtractor {
    fn extract(&self, path: &Path) -> Result<String, Ebook2TxtError> {
        let bytes = std::fs::read(path).map_err(|e| open_error(path, &e))?;

        let signature = bytes.get(SIGNATURE_OFFSET..SIGNATURE_OFFSET + PALMDB_SIGNATURE.len());
        if signature != Some(PALMDB_SIGNATURE) {
            return Err(Ebook2TxtError::MobiDecodeFailed {
                path: path.to_path_buf(),
                detail: "missing BOOKMOBI signature".into(),
            });
        }

        let book = Mobi::new(bytes).map_err(|e| Ebook2TxtError::MobiDecodeFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        debug!("Parsed MOBI headers of {}: \"{}\"", path.display(), book.title());

        // Lossy: invalid sequences become U+FFFD, as for EPUB markup.
        let markup = book.content_as_string_lossy();
        Ok(html::body_text(&markup))
    }
}
