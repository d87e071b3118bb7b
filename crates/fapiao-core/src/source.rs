//! Text sources: the boundary to whatever produced the recognized text.
//!
//! Recognition itself (image OCR) happens elsewhere. This module only reads
//! text that already exists, either as a plain-text sidecar or as the text
//! layer embedded in a PDF.

use std::path::Path;

use tracing::debug;

use crate::error::{Result, SourceError};

/// Anything that can turn a document on disk into recognized text.
pub trait TextSource: Send + Sync {
    /// Read the full recognized text of the document.
    fn read_text(&self, path: &Path) -> Result<String>;
}

/// Reads `.txt` files holding already-recognized text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    fn read_text(&self, path: &Path) -> Result<String> {
        let text = std::fs::read_to_string(path)?;
        non_empty(path, text)
    }
}

/// Reads the embedded text layer of a PDF.
#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextSource;

#[cfg(feature = "pdf")]
impl TextSource for PdfTextSource {
    fn read_text(&self, path: &Path) -> Result<String> {
        let data = std::fs::read(path)?;
        let text = pdf_extract::extract_text_from_mem(&data).map_err(|e| SourceError::PdfText {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!("Extracted {} characters from {}", text.len(), path.display());
        non_empty(path, text)
    }
}

/// Pick a text source by file extension.
pub fn source_for(path: &Path) -> Result<Box<dyn TextSource>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "txt" => Ok(Box::new(PlainTextSource)),
        #[cfg(feature = "pdf")]
        "pdf" => Ok(Box::new(PdfTextSource)),
        _ => Err(SourceError::Unsupported(path.to_path_buf()).into()),
    }
}

fn non_empty(path: &Path, text: String) -> Result<String> {
    if text.trim().is_empty() {
        return Err(SourceError::Empty(path.to_path_buf()).into());
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FapiaoError;

    #[test]
    fn test_plain_text_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.txt");
        std::fs::write(&path, "发票代码: 011002200111").unwrap();

        let source = source_for(&path).unwrap();
        assert_eq!(source.read_text(&path).unwrap(), "发票代码: 011002200111");
    }

    #[test]
    fn test_blank_text_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.TXT");
        std::fs::write(&path, "  \n\t").unwrap();

        let err = source_for(&path).unwrap().read_text(&path).unwrap_err();
        assert!(matches!(err, FapiaoError::Source(SourceError::Empty(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = source_for(Path::new("scan.png")).err().unwrap();
        assert!(matches!(err, FapiaoError::Source(SourceError::Unsupported(_))));
    }
}
