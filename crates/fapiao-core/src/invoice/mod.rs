//! Invoice field extraction module.

pub mod normalize;
mod parser;
pub mod rules;

pub use normalize::normalize_text;
pub use parser::{ChineseInvoiceParser, DocumentKind, ExtractionResult};
pub use rules::AmountSource;

use crate::models::record::InvoiceRecord;

/// Trait for invoice parsing.
///
/// Parsing never fails: fields that cannot be resolved stay empty.
pub trait InvoiceParser {
    /// Parse recognized text into a record with an empty `source_name`.
    fn parse(&self, text: &str) -> ExtractionResult;

    /// Parse the text of one source document.
    fn parse_document(&self, source_name: &str, text: &str) -> ExtractionResult {
        let mut result = self.parse(text);
        result.record.source_name = source_name.to_string();
        result
    }

    /// Parse and keep only the record.
    fn extract_record(&self, source_name: &str, text: &str) -> InvoiceRecord {
        self.parse_document(source_name, text).record
    }
}
