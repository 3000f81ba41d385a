//! Plain text from HTML/XHTML markup.
//!
//! Shared by the EPUB extractor (one call per content document) and the MOBI
//! extractor (one call for the whole decoded book).
//!
//! Two parsers feed the same text rule (text nodes of `<body>`, trimmed,
//! empty ones dropped, joined with `\n`):
//!
//! - [`xhtml_body_text`] reads well-formed XHTML as XML with `quick-xml`, so
//!   self-closing `<title/>` or `<script/>` in `<head>` stay empty elements;
//! - [`body_text`] goes through html5ever via `scraper`, which never rejects
//!   malformed markup; a missing `<body>` is synthesised.
//!
//! [`markup_text`] picks the XML reader for XHTML and falls back to the HTML
//! parser when the document is not well-formed.

use quick_xml::events::Event;
use quick_xml::Reader;
use scraper::{Html, Selector};
use tracing::{debug, warn};

/// Decode raw markup bytes as UTF-8, replacing invalid sequences.
///
/// A UTF-8 BOM is stripped.
pub fn decode_markup(bytes: &[u8]) -> String {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if had_errors {
        warn!("Markup is not valid UTF-8; invalid sequences replaced");
    }
    text.into_owned()
}

/// Text of the `<body>` subtree.
///
/// Each text node is trimmed, empty nodes are dropped, and the rest are
/// joined with `\n`. Text in `<head>` (title, style, metadata) never
/// contributes.
pub fn body_text(markup: &str) -> String {
    let document = Html::parse_document(markup);
    if !document.errors.is_empty() {
        debug!("Markup parsed with {} recoverable errors", document.errors.len());
    }

    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };

    match document.select(&selector).next() {
        Some(body) => join_text_nodes(body.text()),
        None => String::new(),
    }
}

/// Body text of XHTML parsed as XML.
///
/// Entity and character references are resolved; named references beyond
/// the XML set and a few common HTML ones are kept literally. Fails when the
/// markup is not well-formed or has no `<body>` element.
pub fn xhtml_body_text(markup: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(markup);
    let mut nodes: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut depth_in_body = 0usize;
    let mut seen_body = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            format!("XML error at byte {}: {}", reader.error_position(), e)
        })?;
        match event {
            Event::Start(e) => {
                flush_node(&mut current, &mut nodes);
                if depth_in_body > 0 {
                    depth_in_body += 1;
                } else if local_name(e.name().as_ref()) == b"body" {
                    depth_in_body = 1;
                    seen_body = true;
                }
            }
            Event::End(_) => {
                flush_node(&mut current, &mut nodes);
                depth_in_body = depth_in_body.saturating_sub(1);
            }
            Event::Empty(e) => {
                flush_node(&mut current, &mut nodes);
                if depth_in_body == 0 && local_name(e.name().as_ref()) == b"body" {
                    seen_body = true;
                }
            }
            Event::Text(e) if depth_in_body > 0 => {
                current.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::CData(e) if depth_in_body > 0 => {
                current.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::GeneralRef(e) if depth_in_body > 0 => {
                let entity = String::from_utf8_lossy(e.as_ref());
                match resolve_entity(&entity) {
                    Some(resolved) => current.push_str(&resolved),
                    None => {
                        current.push('&');
                        current.push_str(&entity);
                        current.push(';');
                    }
                }
            }
            Event::Comment(_) => flush_node(&mut current, &mut nodes),
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_body {
        return Err("no <body> element".into());
    }
    Ok(nodes.join("\n"))
}

/// Body text of one content document.
///
/// `xml` selects the XML reader (for `application/xhtml+xml`); when that
/// fails the HTML parser takes over.
pub fn markup_text(markup: &str, xml: bool) -> String {
    if !xml {
        return body_text(markup);
    }
    match xhtml_body_text(markup) {
        Ok(text) => text,
        Err(e) => {
            debug!("Not well-formed XHTML ({}), parsing as HTML", e);
            body_text(markup)
        }
    }
}

/// End the current text node.
fn flush_node(current: &mut String, nodes: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        nodes.push(trimmed.to_string());
    }
    current.clear();
}

fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

fn resolve_entity(entity: &str) -> Option<String> {
    let named = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "copy" => "\u{a9}",
        _ => "",
    };
    if !named.is_empty() {
        return Some(named.to_string());
    }

    let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse::<u32>().ok()?
    };
    char::from_u32(code).map(|c| c.to_string())
}

fn join_text_nodes<'a>(nodes: impl Iterator<Item = &'a str>) -> String {
    nodes
        .map(str::trim)
        .filter(|node| !node.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
