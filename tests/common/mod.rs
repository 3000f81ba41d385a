//! Fixture builders shared by the integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

/// A `tempdir` with `input/` created and `output/` + journal paths chosen.
pub struct Workspace {
    pub root: tempfile::TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
    pub journal: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let input = root.path().join("input");
        std::fs::create_dir(&input).expect("create input dir");
        Self {
            output: root.path().join("output"),
            journal: root.path().join("conversion_errors.log"),
            input,
            root,
        }
    }

    pub fn journal_lines(&self) -> Vec<String> {
        std::fs::read_to_string(&self.journal)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn read_output(&self, name: &str) -> String {
        std::fs::read_to_string(self.output.join(name))
            .unwrap_or_else(|e| panic!("reading output {name}: {e}"))
    }
}

/// Wrap `body` markup in a minimal XHTML document.
pub fn xhtml(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <html xmlns=\"http://www.w3.org/1999/xhtml\"><head><title>t</title></head>\
         <body>{body}</body></html>"
    )
}

/// One manifest entry: `href`, and the stored content (`None` = listed in
/// the manifest but absent from the archive).
pub struct Chapter {
    pub href: &'static str,
    pub content: Option<String>,
}

impl Chapter {
    pub fn new(href: &'static str, body: &str) -> Self {
        Self {
            href,
            content: Some(xhtml(body)),
        }
    }

    pub fn missing(href: &'static str) -> Self {
        Self {
            href,
            content: None,
        }
    }
}

/// Write an EPUB 2 container with `chapters` in manifest order.
pub fn write_epub(path: &Path, chapters: &[Chapter]) {
    let file = File::create(path).expect("create epub");
    let mut zip = zip::ZipWriter::new(file);
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default();

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();

    zip.start_file("META-INF/container.xml", deflated).unwrap();
    zip.write_all(
        br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
    )
    .unwrap();

    let mut manifest = String::new();
    let mut spine = String::new();
    for (i, chapter) in chapters.iter().enumerate() {
        manifest.push_str(&format!(
            r#"<item id="c{i}" href="{}" media-type="application/xhtml+xml"/>"#,
            chapter.href
        ));
        spine.push_str(&format!(r#"<itemref idref="c{i}"/>"#));
    }
    manifest.push_str(r#"<item id="css" href="style.css" media-type="text/css"/>"#);

    let opf = format!(
        r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Fixture</dc:title></metadata>
  <manifest>{manifest}</manifest>
  <spine>{spine}</spine>
</package>"#
    );
    zip.start_file("OEBPS/content.opf", deflated).unwrap();
    zip.write_all(opf.as_bytes()).unwrap();

    zip.start_file("OEBPS/style.css", deflated).unwrap();
    zip.write_all(b"p { margin: 0 }").unwrap();

    for chapter in chapters {
        if let Some(ref content) = chapter.content {
            zip.start_file(format!("OEBPS/{}", chapter.href), deflated)
                .unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
    }
    zip.finish().unwrap();
}

/// Bytes of a minimal uncompressed MOBI: PalmDB header, record 0 (PalmDOC +
/// MOBI headers, then the title), one UTF-8 text record holding `html` and
/// the end-of-file record.
pub fn mobi_bytes(title: &str, html: &str) -> Vec<u8> {
    const MOBI_HEADER_LEN: u32 = 232;
    let record0_offset: u32 = 78 + 3 * 8 + 2;
    let name_offset: u32 = 16 + MOBI_HEADER_LEN;
    let text_offset = record0_offset + name_offset + title.len() as u32;
    let eof_offset = text_offset + html.len() as u32;

    let mut out = Vec::new();

    // PalmDB header
    let mut name = [0u8; 32];
    let n = title.len().min(31);
    name[..n].copy_from_slice(&title.as_bytes()[..n]);
    out.extend_from_slice(&name);
    out.extend_from_slice(&[0u8; 28]);
    out.extend_from_slice(b"BOOKMOBI");
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(&3u16.to_be_bytes());
    for (id, offset) in [record0_offset, text_offset, eof_offset]
        .into_iter()
        .enumerate()
    {
        out.extend_from_slice(&offset.to_be_bytes());
        out.extend_from_slice(&(id as u32).to_be_bytes());
    }
    out.extend_from_slice(&[0u8; 2]);
    assert_eq!(out.len(), record0_offset as usize);

    // PalmDOC header: no compression, one text record
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&[0u8; 2]);
    out.extend_from_slice(&(html.len() as u32).to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&4096u16.to_be_bytes());
    out.extend_from_slice(&[0u8; 4]);

    // MOBI header, no EXTH
    let mut mobi = vec![0u8; MOBI_HEADER_LEN as usize];
    mobi[0..4].copy_from_slice(b"MOBI");
    let mut put = |at: usize, value: u32| mobi[at..at + 4].copy_from_slice(&value.to_be_bytes());
    put(4, MOBI_HEADER_LEN);
    put(8, 2); // book
    put(12, 65001); // UTF-8
    put(64, 3); // content is read up to one record before this index
    put(68, name_offset);
    put(72, title.len() as u32);
    put(228, u32::MAX); // no index
    mobi[176..178].copy_from_slice(&1u16.to_be_bytes()); // first content record
    mobi[178..180].copy_from_slice(&1u16.to_be_bytes()); // last content record
    out.extend_from_slice(&mobi);

    out.extend_from_slice(title.as_bytes());
    out.extend_from_slice(html.as_bytes());
    out.extend_from_slice(&[0xe9, 0x8e, 0x0d, 0x0a]);
    out
}
