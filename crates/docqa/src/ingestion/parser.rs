//! Text and PDF file parser

use crate::error::{Error, Result};
use crate::types::FileType;

/// Parsed file with extracted text
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Extracted text content
    pub content: String,
    /// Total pages (PDF only)
    pub total_pages: Option<u32>,
}

impl ParsedDocument {
    /// Whether any text was extracted
    pub fn has_text(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Text and PDF file parser
pub struct FileParser;

impl FileParser {
    /// Parse a file based on its extension
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        match FileType::from_filename(filename) {
            FileType::Pdf => Self::parse_pdf(filename, data),
            file_type @ (FileType::Txt | FileType::Markdown) => Ok(Self::parse_text(data, file_type)),
            FileType::Unknown => Err(Error::file_parse(filename, "Unsupported file type")),
        }
    }

    /// Parse a plain-text or markdown file
    fn parse_text(data: &[u8], file_type: FileType) -> ParsedDocument {
        ParsedDocument {
            file_type,
            content: String::from_utf8_lossy(data).to_string(),
            total_pages: None,
        }
    }

    /// Parse a PDF page by page, joining page text with newlines
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let pages = doc.get_pages();
        let total_pages = pages.len() as u32;

        let page_texts = pages.keys().map(|page_number| {
            doc.extract_text(&[*page_number])
                .map_err(|e| format!("page {}: {}", page_number, e))
        });
        let content = join_pages_or_fallback(filename, page_texts, || {
            pdf_extract::extract_text_from_mem(data).map_err(|e| e.to_string())
        })?;

        Ok(ParsedDocument {
            file_type: FileType::Pdf,
            content,
            total_pages: Some(total_pages),
        })
    }
}

/// Join per-page text with newlines, or run `fallback` on the whole document
/// as soon as one page fails
fn join_pages_or_fallback<I, F>(filename: &str, pages: I, fallback: F) -> Result<String>
where
    I: IntoIterator<Item = std::result::Result<String, String>>,
    F: FnOnce() -> std::result::Result<String, String>,
{
    let mut page_texts = Vec::new();
    for page in pages {
        match page {
            Ok(text) => page_texts.push(clean_page_text(&text)),
            Err(e) => {
                tracing::warn!(
                    "{}: per-page extraction failed ({}), trying whole-document fallback",
                    filename,
                    e
                );
                let text = fallback().map_err(|e| {
                    Error::file_parse(filename, format!("PDF text extraction failed: {}", e))
                })?;
                return Ok(clean_page_text(&text));
            }
        }
    }
    Ok(page_texts.join("\n"))
}

/// Strip NUL bytes and trailing whitespace left by PDF text operators
fn clean_page_text(text: &str) -> String {
    text.replace('\0', "").trim_end().to_string()
}
