//! Rule-based parser for Chinese VAT invoices and rail e-tickets.

use std::time::Instant;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::models::config::ExtractionConfig;
use crate::models::record::{format_amount, InvoiceRecord};

use super::normalize::normalize_text;
use super::rules::{
    amount_after_label, extract_rail_ticket, find_written_amount, is_rail_ticket,
    reconcile_amount, AmountSource, WrittenAmount, DIGIT_AMOUNT_RULES, INVOICE_CODE_RULES,
    INVOICE_NUMBER_RULES, ISSUE_DATE_RULES, ITEM_NAME_RULES,
};
use super::InvoiceParser;

/// Layout family of the parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Regular VAT invoice.
    #[default]
    Generic,
    /// China Railway e-ticket (铁路电子客票).
    RailETicket,
}

/// Result of invoice extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Extracted record.
    pub record: InvoiceRecord,
    /// Which rule set produced the record.
    pub kind: DocumentKind,
    /// Where the final amount came from.
    pub amount_source: AmountSource,
    /// Written amount found in the text, if any.
    #[serde(skip)]
    pub written_amount: Option<WrittenAmount>,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Rule-based parser for Chinese invoices.
#[derive(Debug, Clone)]
pub struct ChineseInvoiceParser {
    /// Whether to cross-check against the written amount.
    reconcile_written_amount: bool,
    /// Maximum tolerated digit/written difference.
    amount_tolerance: Decimal,
}

impl ChineseInvoiceParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    /// Create a parser from extraction configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            reconcile_written_amount: config.reconcile_written_amount,
            amount_tolerance: config.amount_tolerance,
        }
    }

    /// Set written-amount reconciliation.
    pub fn with_reconciliation(mut self, reconcile: bool) -> Self {
        self.reconcile_written_amount = reconcile;
        self
    }

    /// Set the digit/written amount tolerance.
    pub fn with_amount_tolerance(mut self, tolerance: Decimal) -> Self {
        self.amount_tolerance = tolerance;
        self
    }

    fn parse_rail_ticket(&self, text: &str, record: &mut InvoiceRecord) -> AmountSource {
        let fields = extract_rail_ticket(text);
        record.invoice_code = fields.invoice_code;
        record.invoice_number = fields.invoice_number;
        record.item_name = Some(fields.item_name);
        record.amount = fields.amount;

        if record.amount.is_some() {
            AmountSource::DigitForm
        } else {
            AmountSource::None
        }
    }

    fn parse_generic(
        &self,
        text: &str,
        record: &mut InvoiceRecord,
        warnings: &mut Vec<String>,
    ) -> (AmountSource, Option<WrittenAmount>) {
        record.invoice_code = INVOICE_CODE_RULES.extract(text);
        record.invoice_number = INVOICE_NUMBER_RULES.extract(text);
        record.item_name = ITEM_NAME_RULES.extract(text);

        let digit = DIGIT_AMOUNT_RULES.extract(text).or_else(|| {
            record
                .item_name
                .as_deref()
                .and_then(|item| amount_after_label(text, item))
        });

        if !self.reconcile_written_amount {
            record.amount = digit;
            let source = if digit.is_some() { AmountSource::DigitForm } else { AmountSource::None };
            return (source, None);
        }

        let written = find_written_amount(text);
        let outcome = reconcile_amount(digit, written.as_ref().map(|w| w.value), self.amount_tolerance);

        if outcome.conflict {
            if let (Some(d), Some(w)) = (digit, &written) {
                warn!(
                    "Digit amount {} disagrees with written amount {} ({}), using written",
                    format_amount(d),
                    format_amount(w.value),
                    w.source
                );
                warnings.push(format!(
                    "Digit amount {} replaced by written amount {}",
                    format_amount(d),
                    format_amount(w.value)
                ));
            }
        }

        record.amount = outcome.amount;
        (outcome.source, written)
    }
}

impl Default for ChineseInvoiceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceParser for ChineseInvoiceParser {
    fn parse(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();
        let mut warnings = Vec::new();

        let text = normalize_text(text);
        debug!("Parsing invoice from {} characters of text", text.chars().count());

        let mut record = InvoiceRecord {
            issue_date: ISSUE_DATE_RULES.extract(&text),
            ..InvoiceRecord::default()
        };

        let (kind, amount_source, written_amount) = if is_rail_ticket(&text) {
            debug!("Detected rail e-ticket layout");
            let source = self.parse_rail_ticket(&text, &mut record);
            (DocumentKind::RailETicket, source, None)
        } else {
            let (source, written) = self.parse_generic(&text, &mut record, &mut warnings);
            (DocumentKind::Generic, source, written)
        };

        for field in record.missing_fields() {
            warnings.push(format!("Could not extract {}", field));
        }

        info!(
            "Extracted {:?} invoice: code={} number={} amount={}",
            kind,
            record.invoice_code.as_deref().unwrap_or("-"),
            record.invoice_number.as_deref().unwrap_or("-"),
            record.amount_text()
        );

        ExtractionResult {
            record,
            kind,
            amount_source,
            written_amount,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const VAT_INVOICE: &str = r#"
北京增值税电子普通发票
发 票 代 码 ： 011002200111
发 票 号 码 ： 12345678
开 票 日 期 ： 2023 年 03 月 07 日
购买方 名称: 某某科技有限公司
货物或应税劳务、服务名称 规格型号 单位 数量 单价 金额 税率 税额
*信息技术服务*技术服务费 次 1 283.02 283.02 6% 16.98
价税合计(大写) ⊗叁佰圆零角零分 （小写）¥300.00
"#;

    #[test]
    fn test_parse_vat_invoice() {
        let parser = ChineseInvoiceParser::new();
        let result = parser.parse_document("a.pdf", VAT_INVOICE);

        assert_eq!(
            result.record,
            InvoiceRecord {
                source_name: "a.pdf".to_string(),
                issue_date: NaiveDate::from_ymd_opt(2023, 3, 7),
                invoice_code: Some("011002200111".to_string()),
                invoice_number: Some("12345678".to_string()),
                item_name: Some("技术服务费".to_string()),
                amount: Some(dec!(300.00)),
            }
        );
        assert_eq!(result.kind, DocumentKind::Generic);
        assert_eq!(result.amount_source, AmountSource::DigitForm);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_written_amount_corrects_ocr_digits() {
        let text = VAT_INVOICE.replace("¥300.00", "¥800.00");
        let result = ChineseInvoiceParser::new().parse(&text);

        assert_eq!(result.record.amount_text(), "300.00");
        assert_eq!(result.amount_source, AmountSource::Written);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_reconciliation_can_be_disabled() {
        let text = VAT_INVOICE.replace("¥300.00", "¥800.00");
        let result = ChineseInvoiceParser::new().with_reconciliation(false).parse(&text);
        assert_eq!(result.record.amount_text(), "800.00");
    }

    #[test]
    fn test_written_amount_fills_missing_digits() {
        let text = "发票号码: 99887766\n价税合计 伍拾圆零角零分";
        let result = ChineseInvoiceParser::new().parse(text);
        assert_eq!(result.record.amount_text(), "50.00");
        assert_eq!(result.amount_source, AmountSource::Written);
    }

    #[test]
    fn test_rail_ticket_override() {
        let text = "电子发票（铁路电子客票）\n发票号码:24119100001234567890\n开票日期:2024年01月15日\n\
                    中国铁路\n退票费\n￥25.00\n*不应使用*的商品名";
        let result = ChineseInvoiceParser::new().parse(text);

        assert_eq!(result.kind, DocumentKind::RailETicket);
        assert_eq!(result.record.item_name.as_deref(), Some("中国铁路（退票费）"));
        assert_eq!(result.record.amount_text(), "25.00");
        assert_eq!(result.record.invoice_number.as_deref(), Some("24119100001234567890"));
        assert_eq!(result.record.issue_date_text(), "2024年01月15日");
    }

    #[test]
    fn test_item_label_amount_fallback() {
        let text = "名称 办公用品*打印纸\n打印纸：¥50.00";
        let result = ChineseInvoiceParser::new().parse(text);
        assert_eq!(result.record.item_name.as_deref(), Some("打印纸"));
        assert_eq!(result.record.amount, Some(dec!(50)));
    }

    #[test]
    fn test_unrecognizable_text_gives_empty_record() {
        let result = ChineseInvoiceParser::new().parse_document("noise.txt", "#### ---- 0x1F ....");
        assert!(result.record.is_empty());
        assert_eq!(result.record.source_name, "noise.txt");
        assert_eq!(result.warnings.len(), 5);
    }

    #[test]
    fn test_issue_date_keeps_four_digit_year() {
        let result = ChineseInvoiceParser::new().parse("开票日期: 0999年1月2日");
        assert_eq!(result.record.issue_date_text(), "0999年01月2日");
    }
}
