//! Text extraction from uploaded files
//!
//! Extraction never fails: undecodable input degrades to lossy or empty
//! text, and the caller decides whether an all-whitespace result is an error.

use crate::types::{FileType, RawDocument};

/// Replace PDF ligature glyphs and odd spacing with plain characters
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .replace('\u{00A0}', " ") // Non-breaking space -> space
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}

/// Append the visible text of paragraph content, descending into
/// hyperlinks and tracked insertions
fn push_paragraph_text(children: &[docx_rs::ParagraphChild], line: &mut String) {
    for child in children {
        match child {
            docx_rs::ParagraphChild::Run(run) => push_run_text(run, line),
            docx_rs::ParagraphChild::Hyperlink(link) => push_paragraph_text(&link.children, line),
            docx_rs::ParagraphChild::Insert(insert) => {
                for child in &insert.children {
                    if let docx_rs::InsertChild::Run(run) = child {
                        push_run_text(run, line);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_run_text(run: &docx_rs::Run, line: &mut String) {
    for child in &run.children {
        match child {
            docx_rs::RunChild::Text(t) => line.push_str(&t.text),
            docx_rs::RunChild::Tab(_) => line.push('\t'),
            _ => {}
        }
    }
}

/// Multi-format text extractor
pub struct TextExtractor;

impl TextExtractor {
    /// Extract text from a raw document
    pub fn extract_document(doc: &RawDocument) -> String {
        Self::extract(&doc.data, &doc.filename)
    }

    /// Extract text from bytes, dispatching on the filename suffix
    pub fn extract(data: &[u8], filename: &str) -> String {
        let file_type = FileType::from_filename(filename);

        let text = match file_type {
            FileType::Pdf => Self::extract_pdf(data, filename),
            FileType::Docx => Self::extract_docx(data, filename),
            FileType::Txt | FileType::Other => Self::decode_text(data),
        };

        tracing::debug!(
            filename,
            file_type = file_type.display_name(),
            bytes = data.len(),
            chars = text.chars().count(),
            "text extracted"
        );

        text
    }

    /// Decode bytes as UTF-8, replacing invalid sequences with U+FFFD
    pub fn decode_text(data: &[u8]) -> String {
        String::from_utf8_lossy(data).into_owned()
    }

    /// Extract PDF text page by page; each page is followed by a newline
    fn extract_pdf(data: &[u8], filename: &str) -> String {
        let doc = match lopdf::Document::load_mem(data) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Failed to load PDF '{}': {}", filename, e);
                return String::new();
            }
        };

        let pages = doc.get_pages();
        let mut text = String::new();

        for page_number in pages.keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(page_text) => text.push_str(&cleanup_pdf_text(&page_text)),
                Err(e) => {
                    tracing::debug!("No text on page {} of '{}': {}", page_number, filename, e);
                }
            }
            text.push('\n');
        }

        tracing::debug!("Extracted {} PDF pages from '{}'", pages.len(), filename);
        text
    }

    /// Extract DOCX paragraphs in document order, one per line
    fn extract_docx(data: &[u8], filename: &str) -> String {
        let doc = match docx_rs::read_docx(data) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Failed to read DOCX '{}': {}", filename, e);
                return String::new();
            }
        };

        let mut paragraphs = Vec::new();

        for child in &doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                let mut line = String::new();
                push_paragraph_text(&p.children, &mut line);
                paragraphs.push(line);
            }
            // Tables are not paragraphs of the body and are skipped
        }

        paragraphs.join("\n")
    }
}
