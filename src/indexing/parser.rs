// src/indexing/parser.rs
//! Plain-text extraction from uploaded files, selected by MIME type

use std::io::{Cursor, Read};

use anyhow::{Context, Result, anyhow};
use quick_xml::Reader;
use quick_xml::events::Event;

pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PDF_MIME: &str = "application/pdf";

const TEXT_MIMES: [&str; 6] = [
    "text/plain",
    "text/csv",
    "text/html",
    "text/xml",
    "text/markdown",
    "application/json",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Pdf,
    Docx,
}

impl ContentKind {
    /// Ignores MIME parameters such as `; charset=utf-8`
    pub fn for_mime(mime: &str) -> Option<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if TEXT_MIMES.contains(&essence.as_str()) {
            Some(ContentKind::Text)
        } else if essence == PDF_MIME {
            Some(ContentKind::Pdf)
        } else if essence == DOCX_MIME {
            Some(ContentKind::Docx)
        } else {
            None
        }
    }
}

/// Extract text from file bytes. Runs synchronously; PDF parsing in
/// particular is CPU heavy, so callers run this on a blocking thread.
pub fn extract_text(kind: ContentKind, bytes: &[u8]) -> Result<String> {
    let raw = match kind {
        ContentKind::Text => String::from_utf8_lossy(bytes).into_owned(),
        ContentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| anyhow!("Failed to extract PDF text: {}", e))?,
        ContentKind::Docx => extract_docx(bytes)?,
    };
    Ok(clean_text(&raw))
}

/// Collect `w:t` runs from `word/document.xml`, one line per `w:p`
fn extract_docx(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).context("DOCX is not a zip archive")?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("Could not find document.xml in DOCX file")?
        .read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    let mut buf = Vec::new();
    let mut content = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::Text(ref e)) if in_text => {
                content.push_str(&String::from_utf8_lossy(e));
            }
            // Entity references arrive as their own events
            Ok(Event::GeneralRef(ref e)) if in_text => {
                let name = String::from_utf8_lossy(e);
                if let Some(resolved) = quick_xml::escape::resolve_predefined_entity(&name) {
                    content.push_str(resolved);
                } else if let Ok(Some(ch)) = e.resolve_char_ref() {
                    content.push(ch);
                }
            }
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:tab" => content.push('\t'),
                b"w:br" => content.push('\n'),
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => content.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("XML parsing error: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(content)
}

/// Drop control characters, trim line ends and collapse runs of blank lines
pub fn clean_text(text: &str) -> String {
    let filtered: String = text
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    let mut out = String::with_capacity(filtered.len());
    let mut blank_run = 0;
    for line in filtered.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn docx_with(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    /// One page, one line of Helvetica text, with a correct xref table
    fn pdf_with(text: &str) -> Vec<u8> {
        let content = format!("BT /F1 24 Tf 72 720 Td ({}) Tj ET", text);
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_at = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_at
            )
            .as_bytes(),
        );
        pdf
    }

    #[test]
    fn test_pdf_text() {
        let text = extract_text(ContentKind::Pdf, &pdf_with("Foundation survey")).unwrap();
        assert!(text.contains("Foundation"), "extracted: {:?}", text);
        assert!(text.contains("survey"), "extracted: {:?}", text);
    }

    #[test]
    fn test_kind_for_mime() {
        assert_eq!(ContentKind::for_mime("text/plain"), Some(ContentKind::Text));
        assert_eq!(ContentKind::for_mime("text/csv; charset=utf-8"), Some(ContentKind::Text));
        assert_eq!(ContentKind::for_mime("APPLICATION/JSON"), Some(ContentKind::Text));
        assert_eq!(ContentKind::for_mime(PDF_MIME), Some(ContentKind::Pdf));
        assert_eq!(ContentKind::for_mime(DOCX_MIME), Some(ContentKind::Docx));
        assert_eq!(ContentKind::for_mime("image/png"), None);
        assert_eq!(ContentKind::for_mime("application/octet-stream"), None);
    }

    #[test]
    fn test_plain_text_is_lossy_utf8() {
        let text = extract_text(ContentKind::Text, b"caf\xC3\xA9 \xFF ok").unwrap();
        assert!(text.starts_with("café"));
        assert!(text.ends_with("ok"));
    }

    #[test]
    fn test_docx_paragraphs() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Site survey &amp; plan</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Budget is </w:t></w:r><w:r><w:t>40 units</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

        let text = extract_text(ContentKind::Docx, &docx_with(xml)).unwrap();
        assert_eq!(text, "Site survey & plan\nBudget is 40 units");
    }

    #[test]
    fn test_docx_without_body_fails() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(
                "other.xml",
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored),
            )
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert!(extract_text(ContentKind::Docx, &bytes).is_err());
        assert!(extract_text(ContentKind::Docx, b"not a zip").is_err());
    }

    #[test]
    fn test_clean_text_collapses_blank_lines() {
        assert_eq!(clean_text("a  \n\n\n\nb\u{0}\n"), "a\n\nb");
    }
}
