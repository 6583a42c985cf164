//! docqa-text
//!
//! Text extraction for uploaded documents. [`FileExtractor`] dispatches on the
//! file extension to the PDF, DOCX and plain-text readers in this crate.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod docx;
pub mod pdf;
pub mod plain;

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use docqa_core::traits::TextExtractor;
use docqa_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "md" => Some(Self::PlainText),
            _ => None,
        }
    }
}

pub fn is_supported(path: &Path) -> bool {
    DocumentKind::from_path(path).is_some()
}

fn extension_label(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_else(|| "(no extension)".to_string())
}

/// Extractor keyed by file extension (`.pdf`, `.docx`, `.txt`, `.md`).
#[derive(Debug, Clone, Default)]
pub struct FileExtractor {
    max_file_size: Option<u64>,
}

impl FileExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject files larger than `bytes` before reading them.
    pub fn with_max_file_size(bytes: u64) -> Self {
        Self { max_file_size: Some(bytes) }
    }
}

#[async_trait]
impl TextExtractor for FileExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let shown = path.display().to_string();
        let kind = DocumentKind::from_path(path).ok_or_else(|| {
            Error::extraction(&shown, format!("Unsupported file type: {}", extension_label(path)))
        })?;

        let meta = tokio::fs::metadata(path).await.map_err(|e| Error::extraction(&shown, e))?;
        if !meta.is_file() {
            return Err(Error::extraction(&shown, "not a regular file"));
        }
        if let Some(max) = self.max_file_size {
            if meta.len() > max {
                return Err(Error::extraction(
                    &shown,
                    format!("file is {} bytes, limit is {} bytes", meta.len(), max),
                ));
            }
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| Error::extraction(&shown, e))?;
        let text = match kind {
            DocumentKind::Pdf => pdf::extract_text(bytes).await,
            DocumentKind::Docx => docx::extract_text(bytes).await,
            DocumentKind::PlainText => Ok(plain::decode(&bytes)),
        }
        .map_err(|reason| Error::extraction(&shown, reason))?;

        debug!(path = %shown, ?kind, chars = text.chars().count(), "extracted text");
        Ok(text)
    }
}
