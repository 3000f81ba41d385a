//! EPUB text extraction.
//!
//! ## Container opening
//!
//! Opening goes through a [`ContainerOpener`]. The extractor first asks for
//! `OpenOptions { ignore_ncx: true }`, since the legacy NCX table of contents
//! is never needed for text. An opener that does not understand the option
//! answers [`Ebook2TxtError::UnsupportedOpenOption`] and is called again with
//! default options. Both calls list the same manifest items.
//!
//! ## Item walk
//!
//! Manifest items are visited in OPF order. Only XHTML/HTML content documents
//! are read; each becomes an [`ItemText`], and an unreadable item is skipped
//! with a warning instead of failing the book. The book fails only when no
//! item produced text.

use crate::error::{Ebook2TxtError, ItemError};
use crate::extract::{html, Extractor};
use percent_encoding::percent_decode_str;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use zip::result::ZipError;
use zip::ZipArchive;

const CONTAINER_XML: &str = "META-INF/container.xml";
const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

// ── Container ────────────────────────────────────────────────────────────

/// Options understood by a [`ContainerOpener`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Do not read the NCX table of contents.
    pub ignore_ncx: bool,
}

/// What a manifest item holds, derived from its media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// XHTML or HTML content document.
    Document,
    /// EPUB 3 navigation document (`properties="nav"`).
    Navigation,
    Ncx,
    Stylesheet,
    Image,
    Font,
    Other,
}

/// One `<item>` of the OPF manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    /// Href relative to the OPF file, as written in the manifest.
    pub href: String,
    pub media_type: String,
    pub properties: Option<String>,
}

impl ManifestItem {
    /// Media type without parameters, lowercased.
    fn essence(&self) -> String {
        self.media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    /// `application/xhtml+xml`, read as XML before falling back to HTML.
    pub fn is_xhtml(&self) -> bool {
        self.essence() == "application/xhtml+xml"
    }

    pub fn kind(&self) -> ItemKind {
        let media_type = self.essence();
        let is_nav = self
            .properties
            .as_deref()
            .is_some_and(|p| p.split_whitespace().any(|p| p == "nav"));

        match media_type.as_str() {
            "application/xhtml+xml" | "text/html" if is_nav => ItemKind::Navigation,
            "application/xhtml+xml" | "text/html" => ItemKind::Document,
            NCX_MEDIA_TYPE => ItemKind::Ncx,
            "text/css" => ItemKind::Stylesheet,
            m if m.starts_with("image/") => ItemKind::Image,
            m if m.starts_with("font/") || m.contains("font") => ItemKind::Font,
            _ => ItemKind::Other,
        }
    }
}

/// An opened EPUB: the archive plus its parsed manifest.
pub struct EpubContainer {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    /// Directory of the OPF file inside the archive, without trailing slash.
    opf_dir: String,
    items: Vec<ManifestItem>,
    toc: Option<Vec<String>>,
}

impl EpubContainer {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Manifest items in OPF order.
    pub fn items(&self) -> &[ManifestItem] {
        &self.items
    }

    /// NCX navigation labels, or `None` when the NCX was ignored or absent.
    ///
    /// Text extraction never reads this. It is the only observable difference
    /// between an `ignore_ncx` open and a default-options open.
    pub fn toc(&self) -> Option<&[String]> {
        self.toc.as_deref()
    }

    /// Read the raw bytes of one manifest item.
    pub fn read_item(&mut self, item: &ManifestItem) -> Result<Vec<u8>, ItemError> {
        let entry = resolve_href(&self.opf_dir, &item.href);
        read_entry(&mut self.archive, &entry).map_err(|e| match e {
            EntryError::Missing => ItemError::MissingEntry {
                href: entry.clone(),
            },
            EntryError::Unreadable(detail) => ItemError::ReadFailed {
                href: entry.clone(),
                detail,
            },
        })
    }
}

/// Opens EPUB containers.
///
/// Implementations that cannot honour an option must return
/// [`Ebook2TxtError::UnsupportedOpenOption`] so the caller can retry with
/// [`OpenOptions::default()`].
pub trait ContainerOpener: Send + Sync {
    fn open(&self, path: &Path, options: OpenOptions) -> Result<EpubContainer, Ebook2TxtError>;
}

/// Reads the container straight from the zip archive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipContainerOpener;

impl ContainerOpener for ZipContainerOpener {
    fn open(&self, path: &Path, options: OpenOptions) -> Result<EpubContainer, Ebook2TxtError> {
        let fail = |detail: String| Ebook2TxtError::EpubOpenFailed {
            path: path.to_path_buf(),
            detail,
        };

        let file = File::open(path).map_err(|e| fail(e.to_string()))?;
        let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|e| fail(e.to_string()))?;

        let container = read_entry(&mut archive, CONTAINER_XML)
            .map_err(|e| fail(format!("{CONTAINER_XML}: {e}")))?;
        let opf_path = parse_container_xml(&container).map_err(&fail)?;

        let opf = read_entry(&mut archive, &opf_path).map_err(|e| fail(format!("{opf_path}: {e}")))?;
        let package = parse_opf(&xml_text(&opf)).map_err(|e| fail(format!("{opf_path}: {e}")))?;

        let opf_dir = opf_path
            .rsplit_once('/')
            .map(|(dir, _)| dir.to_string())
            .unwrap_or_default();

        let toc = if options.ignore_ncx {
            None
        } else {
            read_ncx(&mut archive, &opf_dir, &package)
        };

        debug!(
            "Opened EPUB {}: {} manifest items, OPF at {}",
            path.display(),
            package.items.len(),
            opf_path
        );

        Ok(EpubContainer {
            path: path.to_path_buf(),
            archive,
            opf_dir,
            items: package.items,
            toc,
        })
    }
}

/// Open with `ignore_ncx`, falling back to default options when the opener
/// rejects it.
pub fn open_container(
    opener: &dyn ContainerOpener,
    path: &Path,
) -> Result<EpubContainer, Ebook2TxtError> {
    match opener.open(path, OpenOptions { ignore_ncx: true }) {
        Err(Ebook2TxtError::UnsupportedOpenOption(option)) => {
            warn!(
                "EPUB opener does not support '{}', retrying {} with default options",
                option,
                path.display()
            );
            opener.open(path, OpenOptions::default())
        }
        other => other,
    }
}

// ── Extraction ───────────────────────────────────────────────────────────

/// Result of reading one content document.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemText {
    Text(String),
    /// The document has no body text.
    Empty,
    /// The document could not be read.
    Skipped(ItemError),
}

/// Read one manifest item and take the text of its body.
pub fn item_text(container: &mut EpubContainer, item: &ManifestItem) -> ItemText {
    let bytes = match container.read_item(item) {
        Ok(bytes) => bytes,
        Err(e) => return ItemText::Skipped(e),
    };

    let text = html::markup_text(&html::decode_markup(&bytes), item.is_xhtml());
    if text.is_empty() {
        ItemText::Empty
    } else {
        ItemText::Text(text)
    }
}

/// Extracts the body text of every content document, blank-line separated.
#[derive(Clone)]
pub struct EpubExtractor {
    opener: Arc<dyn ContainerOpener>,
}

impl Default for EpubExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EpubExtractor {
    pub fn new() -> Self {
        Self::with_opener(Arc::new(ZipContainerOpener))
    }

    pub fn with_opener(opener: Arc<dyn ContainerOpener>) -> Self {
        Self { opener }
    }
}

impl Extractor for EpubExtractor {
    fn extract(&self, path: &Path) -> Result<String, Ebook2TxtError> {
        let mut container = open_container(self.opener.as_ref(), path)?;

        let documents: Vec<ManifestItem> = container
            .items()
            .iter()
            .filter(|item| item.kind() == ItemKind::Document)
            .cloned()
            .collect();

        let mut texts = Vec::with_capacity(documents.len());
        for item in &documents {
            match item_text(&mut container, item) {
                ItemText::Text(text) => texts.push(text),
                ItemText::Empty => debug!("No body text in {}", item.href),
                ItemText::Skipped(e) => warn!("Skipping EPUB item in {}: {}", path.display(), e),
            }
        }

        if texts.is_empty() {
            return Err(Ebook2TxtError::EpubNoText);
        }

        info!(
            "Extracted text from {}/{} EPUB documents",
            texts.len(),
            documents.len()
        );
        Ok(texts.join("\n\n"))
    }
}

// ── Archive helpers ──────────────────────────────────────────────────────

#[derive(Debug)]
enum EntryError {
    Missing,
    Unreadable(String),
}

impl std::fmt::Display for EntryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryError::Missing => f.write_str("not present in archive"),
            EntryError::Unreadable(detail) => f.write_str(detail),
        }
    }
}

/// Read an archive entry, retrying with the percent-decoded name.
fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>, EntryError> {
    let decoded = percent_decode_str(name)
        .decode_utf8()
        .ok()
        .map(Cow::into_owned)
        .filter(|d| d != name);

    for candidate in std::iter::once(name).chain(decoded.as_deref()) {
        match archive.by_name(candidate) {
            Ok(mut file) => {
                let mut contents = Vec::new();
                file.read_to_end(&mut contents)
                    .map_err(|e| EntryError::Unreadable(e.to_string()))?;
                return Ok(contents);
            }
            Err(ZipError::FileNotFound) => continue,
            Err(e) => return Err(EntryError::Unreadable(e.to_string())),
        }
    }
    Err(EntryError::Missing)
}

/// Resolve a manifest href against the OPF directory.
///
/// Drops any fragment and collapses `.` and `..` segments.
fn resolve_href(base: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Default-options path only: load the NCX named by the spine `toc`
/// attribute (or the first NCX item) into [`EpubContainer::toc`].
fn read_ncx<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    opf_dir: &str,
    package: &PackageDocument,
) -> Option<Vec<String>> {
    let ncx = package
        .toc_id
        .as_deref()
        .and_then(|id| package.items.iter().find(|item| item.id == id))
        .or_else(|| package.items.iter().find(|item| item.kind() == ItemKind::Ncx))?;

    let entry = resolve_href(opf_dir, &ncx.href);
    let bytes = match read_entry(archive, &entry) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("NCX {} unavailable: {}", entry, e);
            return None;
        }
    };

    match parse_ncx_labels(&xml_text(&bytes)) {
        Ok(labels) => Some(labels),
        Err(e) => {
            warn!("Ignoring malformed NCX {}: {}", entry, e);
            None
        }
    }
}

// ── XML parsing ──────────────────────────────────────────────────────────

struct PackageDocument {
    items: Vec<ManifestItem>,
    /// `toc` attribute of `<spine>`: the manifest id of the NCX.
    toc_id: Option<String>,
}

fn xml_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(strip_bom(bytes)).into_owned()
}

fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(data)
}

/// Extract local name from potentially namespaced XML name
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| {
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            let unescaped = quick_xml::escape::unescape(&raw)
                .map(|v| v.into_owned())
                .ok();
            unescaped.unwrap_or(raw)
        })
}

fn parse_container_xml(bytes: &[u8]) -> Result<String, String> {
    let content = xml_text(bytes);
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"rootfile" =>
            {
                if let Some(path) = attribute(&e, b"full-path") {
                    return Ok(path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("{CONTAINER_XML}: {e}")),
            _ => {}
        }
    }

    Err(format!("No rootfile found in {CONTAINER_XML}"))
}

fn parse_opf(content: &str) -> Result<PackageDocument, String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut toc_id = None;
    let mut in_manifest = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"manifest" => in_manifest = true,
                b"item" if in_manifest => {
                    let (Some(id), Some(href)) = (attribute(&e, b"id"), attribute(&e, b"href"))
                    else {
                        debug!("Skipping manifest item without id or href");
                        continue;
                    };
                    items.push(ManifestItem {
                        id,
                        href,
                        media_type: attribute(&e, b"media-type").unwrap_or_default(),
                        properties: attribute(&e, b"properties"),
                    });
                }
                b"spine" => toc_id = attribute(&e, b"toc"),
                _ => {}
            },
            Ok(Event::End(e)) if local_name(e.name().as_ref()) == b"manifest" => {
                in_manifest = false;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
    }

    Ok(PackageDocument { items, toc_id })
}

/// Collect the `<navLabel><text>` strings of an NCX, in document order.
///
/// Feeds [`EpubContainer::toc`] and nothing else.
fn parse_ncx_labels(content: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut labels: Vec<String> = Vec::new();
    let mut in_label = false;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"navLabel" => in_label = true,
                b"text" if in_label => {
                    in_text = true;
                    labels.push(String::new());
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                if let Some(label) = labels.last_mut() {
                    label.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"navLabel" => in_label = false,
                b"text" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
    }

    labels.retain(|label| !label.is_empty());
    Ok(labels)
}
