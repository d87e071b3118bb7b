//! Text normalization ahead of field extraction.
//!
//! OCR and PDF text layers often break labels apart (`发 票 号 码 ：`) or mix
//! half-width and full-width punctuation. Labels are rewritten to a single
//! canonical `label:` form so the field rules only need to know one shape.

use regex::{NoExpand, Regex};

use super::rules::patterns::{
    INVOICE_CODE_LABEL, INVOICE_CODE_LABEL_LOOSE, INVOICE_NUMBER_LABEL, INVOICE_NUMBER_LABEL_LOOSE,
    ISSUE_DATE_LABEL, ISSUE_DATE_LABEL_LOOSE, SMALL_WRITING_LOOSE, SMALL_WRITING_MARKER,
};

/// Normalize recognized text. Idempotent.
pub fn normalize_text(text: &str) -> String {
    let number_label = format!("{}:", INVOICE_NUMBER_LABEL);
    let code_label = format!("{}:", INVOICE_CODE_LABEL);
    let date_label = format!("{}:", ISSUE_DATE_LABEL);

    let rewrites: [(&Regex, &str); 4] = [
        (&*INVOICE_NUMBER_LABEL_LOOSE, number_label.as_str()),
        (&*INVOICE_CODE_LABEL_LOOSE, code_label.as_str()),
        (&*ISSUE_DATE_LABEL_LOOSE, date_label.as_str()),
        (&*SMALL_WRITING_LOOSE, SMALL_WRITING_MARKER),
    ];

    let mut text = text.to_string();
    for (re, canonical) in rewrites {
        if re.is_match(&text) {
            text = re.replace_all(&text, NoExpand(canonical)).into_owned();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collapses_spaced_labels() {
        assert_eq!(
            normalize_text("发 票 代 码 ： 011002200111\n发票 号码 12345678"),
            "发票代码: 011002200111\n发票号码:12345678"
        );
        assert_eq!(normalize_text("开 票 日 期：2023年03月07日"), "开票日期:2023年03月07日");
    }

    #[test]
    fn test_unifies_small_writing_marker() {
        assert_eq!(normalize_text("（ 小写 ）¥12.00"), "(小写)¥12.00");
        assert_eq!(normalize_text("(小写）¥12.00"), "(小写)¥12.00");
    }

    #[test]
    fn test_idempotent() {
        let raw = "发 票 号 码：12345678\n开票日期 2023年3月7日\n（小写）￥88.00\n发票代码011002200111";
        let once = normalize_text(raw);
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn test_canonical_text_unchanged() {
        let canonical = "发票代码: 011002200111\n发票号码: 12345678\n开票日期: 2023年03月7日\n(小写)¥1.00";
        assert_eq!(normalize_text(canonical), canonical);
    }

    #[test]
    fn test_unrelated_text_unchanged() {
        let text = "购买方名称: 某某有限公司\n合计 ¥100.00";
        assert_eq!(normalize_text(text), text);
    }
}
