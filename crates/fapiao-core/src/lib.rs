//! Core library for Chinese invoice (发票) field extraction.
//!
//! This crate provides:
//! - Normalization of noisy recognized text around invoice labels
//! - Ordered rule chains for issue date, invoice code and number, item name
//!   and amount, including a rail e-ticket override
//! - Parsing of written financial numerals (大写金额) and reconciliation
//!   against the digit-form amount
//! - Duplicate grouping of source files by invoice code and number
//!
//! Text recognition itself is delegated to a [`TextSource`].

pub mod error;
pub mod models;
pub mod source;
pub mod invoice;
pub mod dedup;

pub use error::{FapiaoError, Result, SourceError};
pub use models::record::{InvoiceRecord, renamed_file_name};
pub use models::config::FapiaoConfig;
pub use source::{TextSource, PlainTextSource, source_for};
#[cfg(feature = "pdf")]
pub use source::PdfTextSource;
pub use invoice::{ChineseInvoiceParser, InvoiceParser, ExtractionResult, DocumentKind, AmountSource};
pub use dedup::{DuplicateGrouper, GroupId, GroupOutcome, GroupMerge};
