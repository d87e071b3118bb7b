//! Error types for the fapiao-core library.
//!
//! Field extraction and duplicate grouping never fail: unresolved fields are
//! represented as empty values. Errors only arise at the edges, when reading
//! document text or configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the fapiao library.
#[derive(Error, Debug)]
pub enum FapiaoError {
    /// Text source error.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while obtaining the recognized text of a document.
#[derive(Error, Debug)]
pub enum SourceError {
    /// No text source handles this file type.
    #[error("unsupported file type: {}", .0.display())]
    Unsupported(PathBuf),

    /// The PDF text layer could not be read.
    #[error("failed to extract PDF text from {path}: {reason}")]
    PdfText { path: String, reason: String },

    /// The document yielded no text at all.
    #[error("no text found in {}", .0.display())]
    Empty(PathBuf),
}

/// Result type for the fapiao library.
pub type Result<T> = std::result::Result<T, FapiaoError>;
