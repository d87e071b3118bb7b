//! Item name (商品名称) extraction.
//!
//! VAT invoices print goods as `*category*name`, e.g. `*餐饮服务*餐饮费`.
//! The text after the second asterisk is the candidate name.

use super::patterns::{CATERING_MARKER, FUEL_MARKER, IDEOGRAPH, ITEM_DELIMITED, ITEM_IDEOGRAPHIC};
use super::{FieldRule, RuleChain};

const ASTERISKS: [char; 2] = ['*', '＊'];

/// Item name rules, in priority order.
pub const ITEM_NAME_RULES: RuleChain<String> = RuleChain::new(
    "item_name",
    &[
        FieldRule { name: "category_marker", apply: category_marker },
        FieldRule { name: "asterisk_candidate", apply: from_candidate },
        FieldRule { name: "whole_text", apply: from_whole_text },
    ],
);

/// Fuel and catering invoices are summarized by their category alone.
fn category_marker(text: &str) -> Option<String> {
    [FUEL_MARKER, CATERING_MARKER]
        .into_iter()
        .find(|marker| text.contains(marker))
        .map(str::to_string)
}

fn from_candidate(text: &str) -> Option<String> {
    let candidate = cleaned_candidate(text)?;
    if IDEOGRAPH.find_iter(candidate).count() < 2 {
        return None;
    }
    ITEM_IDEOGRAPHIC.find(candidate).map(|m| m.as_str().to_string())
}

/// Only used when the text has no usable asterisk candidate at all.
fn from_whole_text(text: &str) -> Option<String> {
    if cleaned_candidate(text).is_some() {
        return None;
    }
    ITEM_IDEOGRAPHIC.find(text).map(|m| m.as_str().to_string())
}

/// The raw text following the category asterisks.
///
/// Falls back to the text after the last asterisk of a line when OCR lost
/// the leading one (`餐饮服务*餐饮费`).
pub fn item_candidate(text: &str) -> Option<&str> {
    if let Some(caps) = ITEM_DELIMITED.captures(text) {
        return caps.get(1).map(|m| m.as_str().trim());
    }

    text.lines()
        .filter(|line| line.contains(ASTERISKS))
        .filter_map(|line| line.rsplit(ASTERISKS).next())
        .map(str::trim)
        .find(|tail| !tail.is_empty())
}

/// Candidate with trailing quantities, prices and punctuation removed;
/// `None` if nothing is left.
fn cleaned_candidate(text: &str) -> Option<&str> {
    let cleaned = item_candidate(text)?
        .trim_end_matches(|c: char| c.is_ascii_digit() || !c.is_alphanumeric())
        .trim();
    (!cleaned.is_empty()).then_some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimited_item() {
        let text = "货物或应税劳务名称\n*信息技术服务*技术服务费 1 6% 300.00";
        let hit = ITEM_NAME_RULES.evaluate(text).unwrap();
        assert_eq!(hit.rule, "asterisk_candidate");
        assert_eq!(hit.value, "技术服务费");
    }

    #[test]
    fn test_full_width_asterisks() {
        let text = "＊运输服务＊客运服务费 88.00";
        assert_eq!(ITEM_NAME_RULES.extract(text), Some("客运服务费".to_string()));
    }

    #[test]
    fn test_lost_leading_asterisk() {
        let text = "名称\n办公用品*打印纸 2 50.00";
        assert_eq!(item_candidate(text), Some("打印纸 2 50.00"));
        assert_eq!(ITEM_NAME_RULES.extract(text), Some("打印纸".to_string()));
    }

    #[test]
    fn test_category_markers_take_precedence() {
        let text = "*汽油*92号车用汽油(VIB)";
        let hit = ITEM_NAME_RULES.evaluate(text).unwrap();
        assert_eq!(hit.rule, "category_marker");
        assert_eq!(hit.value, "汽油");

        assert_eq!(ITEM_NAME_RULES.extract("*餐饮服务*餐费"), Some("餐饮".to_string()));
    }

    #[test]
    fn test_single_ideograph_candidate_is_rejected() {
        // A candidate exists, so the whole-text scan does not run either.
        assert_eq!(ITEM_NAME_RULES.extract("*类别*a书b 12"), None);
    }

    #[test]
    fn test_whole_text_fallback() {
        let hit = ITEM_NAME_RULES.evaluate("1 咨询服务 200.00").unwrap();
        assert_eq!(hit.rule, "whole_text");
        assert_eq!(hit.value, "咨询服务");
    }

    #[test]
    fn test_candidate_of_only_digits_falls_back() {
        let text = "*12*34\n住宿服务";
        assert_eq!(ITEM_NAME_RULES.extract(text), Some("住宿服务".to_string()));
    }

    #[test]
    fn test_no_item() {
        assert_eq!(ITEM_NAME_RULES.extract("No. 12345 ABC"), None);
    }
}
