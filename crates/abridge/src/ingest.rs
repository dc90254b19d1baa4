//! Document ingestion.
//!
//! The pipeline only needs normalized text and its word count. Extraction
//! from a concrete source sits behind [`TextExtractor`]; the bundled
//! [`PlainTextExtractor`] reads UTF-8 text and Markdown files.

use crate::error::IngestError;
use crate::text::{clean_text, count_words};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Largest file the plain-text extractor accepts (10 MiB).
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// File extensions the plain-text extractor accepts.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Facts about an extracted document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentMeta {
    pub source_name: String,
    pub size_bytes: u64,
    /// Only meaningful for paginated formats.
    pub page_count: Option<u32>,
    pub word_count: usize,
}

/// Normalized text plus its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    pub text: String,
    pub meta: DocumentMeta,
}

impl ExtractedDocument {
    /// Wrap in-memory text, normalizing it the same way files are.
    pub fn from_text(source_name: impl Into<String>, raw: &str) -> Self {
        let text = clean_text(raw);
        let word_count = count_words(&text);
        Self {
            meta: DocumentMeta {
                source_name: source_name.into(),
                size_bytes: raw.len() as u64,
                page_count: None,
                word_count,
            },
            text,
        }
    }
}

/// Turns a source reference into normalized text.
pub trait TextExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedDocument, IngestError>;
}

/// Reads `.txt`, `.md` and `.markdown` files.
#[derive(Debug, Clone)]
pub struct PlainTextExtractor {
    max_bytes: u64,
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self {
            max_bytes: MAX_FILE_BYTES,
        }
    }
}

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedDocument, IngestError> {
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| TEXT_EXTENSIONS.iter().any(|ok| e.eq_ignore_ascii_case(ok)));
        if !supported {
            return Err(IngestError::UnsupportedExtension {
                path: path.to_path_buf(),
            });
        }

        let io_err = |source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        };
        let size_bytes = std::fs::metadata(path).map_err(io_err)?.len();
        if size_bytes > self.max_bytes {
            return Err(IngestError::TooLarge {
                path: path.to_path_buf(),
                size_bytes,
                max_bytes: self.max_bytes,
            });
        }

        let bytes = std::fs::read(path).map_err(io_err)?;
        let raw = String::from_utf8(bytes).map_err(|_| IngestError::NotUtf8 {
            path: path.to_path_buf(),
        })?;
        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut document = ExtractedDocument::from_text(source_name, &raw);
        document.meta.size_bytes = size_bytes;
        debug!(
            "Extracted {} ({} bytes, {} words)",
            document.meta.source_name, size_bytes, document.meta.word_count
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn extracts_markdown_file() {
        let file = temp_file(".md", b"# Title\n\nPage 2\nSome body text here.\n");
        let doc = PlainTextExtractor::new().extract(file.path()).unwrap();
        assert_eq!(doc.text, "# Title\nSome body text here.");
        assert_eq!(doc.meta.word_count, 6);
        assert_eq!(doc.meta.page_count, None);
        assert!(doc.meta.source_name.ends_with(".md"));
        assert_eq!(doc.meta.size_bytes, 37);
    }

    #[test]
    fn rejects_unsupported_extension() {
        let file = temp_file(".pdf", b"%PDF-1.4");
        let err = PlainTextExtractor::new().extract(file.path()).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedExtension { .. }));
    }

    #[test]
    fn rejects_oversized_file() {
        let file = temp_file(".txt", &[b'a'; 64]);
        let err = PlainTextExtractor::new()
            .with_max_bytes(32)
            .extract(file.path())
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::TooLarge {
                size_bytes: 64,
                max_bytes: 32,
                ..
            }
        ));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let file = temp_file(".txt", &[0xff, 0xfe, 0x00, 0x41]);
        let err = PlainTextExtractor::new().extract(file.path()).unwrap_err();
        assert!(matches!(err, IngestError::NotUtf8 { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PlainTextExtractor::new()
            .extract(Path::new("/nonexistent/notes.txt"))
            .unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }

    #[test]
    fn from_text_normalizes() {
        let doc = ExtractedDocument::from_text("inline", "a   b\n\n\nc");
        assert_eq!(doc.text, "a b\nc");
        assert_eq!(doc.meta.word_count, 3);
    }
}
