//! Digit-form amounts (金额(小写)) and reconciliation against the written
//! amount.

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use super::patterns::AMOUNT_SMALL_WRITING;
use super::{FieldRule, RuleChain};

/// Digit amount rules, in priority order.
pub const DIGIT_AMOUNT_RULES: RuleChain<Decimal> = RuleChain::new(
    "amount",
    &[FieldRule { name: "small_writing", apply: small_writing_amount }],
);

/// Amount after the `(小写)` marker, optionally behind a currency sign.
fn small_writing_amount(text: &str) -> Option<Decimal> {
    AMOUNT_SMALL_WRITING
        .captures(text)
        .and_then(|caps| parse_digit_amount(&caps[1]))
}

/// Amount printed right after the item name, e.g. `票价:￥54.50`.
pub fn amount_after_label(text: &str, label: &str) -> Option<Decimal> {
    let pattern = format!(r"{}[:：]\s*[¥￥?？]?\s*([0-9.,]+)", regex::escape(label));
    let re = Regex::new(&pattern).ok()?;
    re.captures(text).and_then(|caps| parse_digit_amount(&caps[1]))
}

/// Parse a captured digit-form amount.
///
/// Everything except ASCII digits and `.` is dropped first, so thousands
/// separators are tolerated. The result is rounded to two places. Tokens
/// that still do not parse (`"."`, `"1.2.3"`) give `None`.
pub fn parse_digit_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let amount = Decimal::from_str(&cleaned).ok()?;
    if amount.is_sign_negative() {
        return None;
    }
    Some(amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Where the final amount of a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountSource {
    /// No amount could be determined.
    #[default]
    None,
    /// The printed digit form.
    DigitForm,
    /// The written numeral form.
    Written,
}

/// Outcome of cross-checking the two amount representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    /// Final amount.
    pub amount: Option<Decimal>,
    /// Which representation it came from.
    pub source: AmountSource,
    /// Both forms were present and disagreed beyond the tolerance.
    pub conflict: bool,
}

/// Reconcile the digit-form amount with the written amount.
///
/// The written form is legally binding on the document and survives OCR
/// better, so it replaces the digit form when the digit form is missing or
/// differs by strictly more than `tolerance`. A difference of exactly
/// `tolerance` keeps the digit form.
pub fn reconcile_amount(
    digit: Option<Decimal>,
    written: Option<Decimal>,
    tolerance: Decimal,
) -> Reconciliation {
    let written = written.map(|w| w.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero));

    match (digit, written) {
        (None, None) => Reconciliation { amount: None, source: AmountSource::None, conflict: false },
        (Some(d), None) => Reconciliation { amount: Some(d), source: AmountSource::DigitForm, conflict: false },
        (None, Some(w)) => Reconciliation { amount: Some(w), source: AmountSource::Written, conflict: false },
        (Some(d), Some(w)) if (d - w).abs() > tolerance => {
            Reconciliation { amount: Some(w), source: AmountSource::Written, conflict: true }
        }
        (Some(d), Some(_)) => Reconciliation { amount: Some(d), source: AmountSource::DigitForm, conflict: false },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

    #[test]
    fn test_parse_digit_amount() {
        assert_eq!(parse_digit_amount("1,234.50"), Some(dec!(1234.50)));
        assert_eq!(parse_digit_amount("88"), Some(dec!(88)));
        assert_eq!(parse_digit_amount("12.345"), Some(dec!(12.35)));
        assert_eq!(parse_digit_amount("."), None);
        assert_eq!(parse_digit_amount("1.2.3"), None);
        assert_eq!(parse_digit_amount(""), None);
    }

    #[test]
    fn test_small_writing_rule() {
        assert_eq!(DIGIT_AMOUNT_RULES.extract("合计 (小写)¥123.45"), Some(dec!(123.45)));
        assert_eq!(DIGIT_AMOUNT_RULES.extract("（小写） ￥ 88.00"), Some(dec!(88)));
        // OCR misread of the yuan sign.
        assert_eq!(DIGIT_AMOUNT_RULES.extract("(小写)?66.10"), Some(dec!(66.1)));
        assert_eq!(DIGIT_AMOUNT_RULES.extract("合计 ¥123.45"), None);
    }

    #[test]
    fn test_amount_after_label() {
        assert_eq!(amount_after_label("打印纸：¥50.00", "打印纸"), Some(dec!(50)));
        assert_eq!(amount_after_label("打印纸 50.00", "打印纸"), None);
    }

    #[test]
    fn test_boundary_difference_keeps_digit_form() {
        let r = reconcile_amount(Some(dec!(100.00)), Some(dec!(100.01)), TOLERANCE);
        assert_eq!(r.amount, Some(dec!(100.00)));
        assert_eq!(r.source, AmountSource::DigitForm);
        assert!(!r.conflict);
    }

    #[test]
    fn test_disagreement_prefers_written() {
        let r = reconcile_amount(Some(dec!(180.00)), Some(dec!(100.00)), TOLERANCE);
        assert_eq!(r.amount, Some(dec!(100.00)));
        assert_eq!(r.source, AmountSource::Written);
        assert!(r.conflict);
    }

    #[test]
    fn test_missing_digit_form_uses_written() {
        let r = reconcile_amount(None, Some(dec!(50)), TOLERANCE);
        assert_eq!(r.amount.map(|a| format!("{:.2}", a)), Some("50.00".to_string()));
        assert_eq!(r.source, AmountSource::Written);
    }

    #[test]
    fn test_both_absent() {
        let r = reconcile_amount(None, None, TOLERANCE);
        assert_eq!(r, Reconciliation { amount: None, source: AmountSource::None, conflict: false });
    }
}
