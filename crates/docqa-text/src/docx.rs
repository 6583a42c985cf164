//! DOCX reader.
//!
//! A `.docx` file is a zip container; the body text lives in
//! `word/document.xml` as `<w:t>` runs grouped into `<w:p>` paragraphs.

use std::io::{Cursor, Read};

const DOCUMENT_XML: &str = "word/document.xml";

pub async fn extract_text(bytes: Vec<u8>) -> Result<String, String> {
    tokio::task::spawn_blocking(move || read_document_xml(&bytes).map(|xml| extract_plaintext_from_docx_xml(&xml)))
        .await
        .map_err(|e| format!("DOCX extraction task failed: {e}"))?
}

fn read_document_xml(bytes: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("not a DOCX container: {e}"))?;
    let mut entry = archive
        .by_name(DOCUMENT_XML)
        .map_err(|e| format!("missing {DOCUMENT_XML}: {e}"))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| format!("unreadable {DOCUMENT_XML}: {e}"))?;
    Ok(xml)
}

/// Plain text of a WordprocessingML body: text runs are concatenated, each
/// paragraph ends with a newline, tabs and breaks inside runs are kept.
pub fn extract_plaintext_from_docx_xml(xml: &str) -> String {
    let mut out = String::new();
    let mut in_run = false;
    let mut in_text = false;
    let mut rest = xml;

    while let Some(open) = rest.find('<') {
        if in_text {
            out.push_str(&decode_entities(&rest[..open]));
        }
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        let tag = &rest[open + 1..open + close];
        let closing = tag.starts_with('/');
        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default();

        match (name, closing) {
            ("w:r", false) => in_run = !self_closing,
            ("w:r", true) => in_run = false,
            ("w:t", false) => in_text = !self_closing,
            ("w:t", true) => in_text = false,
            ("w:p", true) => out.push('\n'),
            ("w:p", false) if self_closing => out.push('\n'),
            ("w:tab", false) if in_run => out.push('\t'),
            ("w:br" | "w:cr", false) if in_run => out.push('\n'),
            _ => {}
        }
        rest = &rest[open + close + 1..];
    }
    out
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        let decoded = after.find(';').and_then(|semi| decode_entity(&after[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
