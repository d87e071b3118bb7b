//! Invoice code (发票代码) and invoice number (发票号码) extraction.

use super::patterns::{
    DIGIT_RUN, INVOICE_CODE, INVOICE_CODE_LABEL, INVOICE_NUMBER, INVOICE_NUMBER_SEAL, WHITESPACE,
};
use super::{FieldRule, RuleChain};

/// Length of a printed invoice code.
pub const INVOICE_CODE_DIGITS: usize = 12;

/// Invoice code rules, in priority order.
pub const INVOICE_CODE_RULES: RuleChain<String> = RuleChain::new(
    "invoice_code",
    &[
        FieldRule { name: "labeled", apply: labeled_code },
        FieldRule { name: "condensed_12_digits", apply: condensed_code },
    ],
);

/// Invoice number rules, in priority order.
pub const INVOICE_NUMBER_RULES: RuleChain<String> = RuleChain::new(
    "invoice_number",
    &[
        FieldRule { name: "labeled", apply: labeled_number },
        FieldRule { name: "supervision_seal", apply: seal_number },
    ],
);

/// `发票代码: <alnum>`.
pub fn labeled_code(text: &str) -> Option<String> {
    INVOICE_CODE.captures(text).map(|caps| caps[1].to_string())
}

/// `发票号码: <alnum>`.
pub fn labeled_number(text: &str) -> Option<String> {
    INVOICE_NUMBER.captures(text).map(|caps| caps[1].to_string())
}

/// Digits following the supervision seal text; at least six of them.
fn seal_number(text: &str) -> Option<String> {
    INVOICE_NUMBER_SEAL.captures(text).map(|caps| caps[1].to_string())
}

/// When the code label is present but its value was split off by layout
/// noise, take the first stand-alone 12-digit run of the text with all
/// whitespace removed.
fn condensed_code(text: &str) -> Option<String> {
    if !text.contains(INVOICE_CODE_LABEL) {
        return None;
    }

    let condensed = WHITESPACE.replace_all(text, "");
    DIGIT_RUN
        .find_iter(&condensed)
        .find(|m| m.as_str().len() == INVOICE_CODE_DIGITS)
        .map(|m| m.as_str().to_string())
}
