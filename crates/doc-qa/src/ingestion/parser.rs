//! Plain-text extraction for the accepted upload formats

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::document::{extension_of, FileType};

/// Parsed document with extracted text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Extracted text content
    pub content: String,
    /// Total pages (PDF only)
    pub total_pages: Option<u32>,
}

/// Format-dispatching file parser
pub struct FileParser;

impl FileParser {
    /// Read and parse the file at `path`
    pub fn parse_path(path: impl AsRef<Path>) -> Result<ParsedDocument> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        // Guard before touching the file
        Self::detect(&filename)?;

        let data = std::fs::read(path)?;
        Self::parse(&filename, &data)
    }

    /// Parse in-memory file content, dispatching on the extension of `filename`
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        match Self::detect(filename)? {
            FileType::Pdf => Self::parse_pdf(filename, data),
            file_type @ (FileType::Txt | FileType::Markdown) => {
                Self::parse_text(filename, data, file_type)
            }
        }
    }

    fn detect(filename: &str) -> Result<FileType> {
        FileType::from_path(filename).ok_or_else(|| {
            let ext = extension_of(filename);
            Error::UnsupportedFormat(if ext.is_empty() {
                format!("'{}' has no extension", filename)
            } else {
                ext
            })
        })
    }

    /// Text and markdown are taken verbatim
    fn parse_text(filename: &str, data: &[u8], file_type: FileType) -> Result<ParsedDocument> {
        let content = std::str::from_utf8(data)
            .map_err(|e| Error::file_parse(filename, format!("File is not valid UTF-8: {}", e)))?
            .to_string();

        Ok(ParsedDocument {
            file_type,
            content,
            total_pages: None,
        })
    }

    /// Extract each page and concatenate; a page without extractable text
    /// contributes nothing
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let pages = doc.get_pages();
        let mut content = String::new();

        for page_number in pages.keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => content.push_str(&text),
                Err(e) => {
                    tracing::debug!(
                        "No extractable text on page {} of '{}': {}",
                        page_number,
                        filename,
                        e
                    );
                }
            }
        }

        Ok(ParsedDocument {
            file_type: FileType::Pdf,
            content,
            total_pages: Some(pages.len() as u32),
        })
    }
}
