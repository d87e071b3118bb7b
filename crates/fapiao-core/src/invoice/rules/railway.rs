//! Rail e-ticket (铁路电子客票) extraction.
//!
//! Rail tickets do not follow the VAT invoice layout: there is no `(小写)`
//! marker, no `*category*` goods line and no written amount. Only the
//! labeled code and number rules apply.

use rust_decimal::Decimal;

use super::amounts::parse_digit_amount;
use super::identifiers::{labeled_code, labeled_number};
use super::patterns::{E_TICKET_MARKER, RAIL_AMOUNT, RAIL_CARRIER_MARKER, RAIL_FEE_AMOUNT, RAIL_FEE_LABEL};
use super::{FieldRule, RuleChain};

/// Item name used when no fee label is printed.
pub const DEFAULT_RAIL_ITEM: &str = "中国铁路电子客票";

/// Rail invoice code rules.
pub const RAIL_CODE_RULES: RuleChain<String> =
    RuleChain::new("invoice_code", &[FieldRule { name: "labeled", apply: labeled_code }]);

/// Rail invoice number rules.
pub const RAIL_NUMBER_RULES: RuleChain<String> =
    RuleChain::new("invoice_number", &[FieldRule { name: "labeled", apply: labeled_number }]);

/// Rail amount rules, in priority order.
pub const RAIL_AMOUNT_RULES: RuleChain<Decimal> = RuleChain::new(
    "amount",
    &[
        FieldRule { name: "currency_symbol", apply: currency_amount },
        FieldRule { name: "fee_label", apply: fee_label_amount },
    ],
);

/// Fields read from a rail e-ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RailTicketFields {
    pub invoice_code: Option<String>,
    pub invoice_number: Option<String>,
    pub item_name: String,
    pub amount: Option<Decimal>,
}

/// True when the text carries both the rail carrier and e-ticket markers.
pub fn is_rail_ticket(text: &str) -> bool {
    text.contains(RAIL_CARRIER_MARKER) && text.contains(E_TICKET_MARKER)
}

/// Extract the rail-specific fields.
pub fn extract_rail_ticket(text: &str) -> RailTicketFields {
    RailTicketFields {
        invoice_code: RAIL_CODE_RULES.extract(text),
        invoice_number: RAIL_NUMBER_RULES.extract(text),
        item_name: rail_item_name(text),
        amount: RAIL_AMOUNT_RULES.extract(text),
    }
}

/// `中国铁路（<fee label>）`, or the generic e-ticket name.
pub fn rail_item_name(text: &str) -> String {
    RAIL_FEE_LABEL
        .captures(text)
        .map(|caps| format!("{}（{}）", RAIL_CARRIER_MARKER, &caps[1]))
        .unwrap_or_else(|| DEFAULT_RAIL_ITEM.to_string())
}

fn currency_amount(text: &str) -> Option<Decimal> {
    RAIL_AMOUNT
        .captures(text)
        .and_then(|caps| parse_digit_amount(&caps[1]))
}

fn fee_label_amount(text: &str) -> Option<Decimal> {
    RAIL_FEE_AMOUNT
        .captures(text)
        .and_then(|caps| parse_digit_amount(&caps[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_refund_fee_ticket() {
        let text = "电子发票(铁路电子客票)\n发票号码:24119100001234567890\n中国铁路\n退票费\n￥25.00";
        assert!(is_rail_ticket(text));

        let fields = extract_rail_ticket(text);
        assert_eq!(
            fields,
            RailTicketFields {
                invoice_code: None,
                invoice_number: Some("24119100001234567890".to_string()),
                item_name: "中国铁路（退票费）".to_string(),
                amount: Some(dec!(25.00)),
            }
        );
    }

    #[test]
    fn test_default_item_name() {
        assert_eq!(rail_item_name("中国铁路 电子客票 ￥54.5"), DEFAULT_RAIL_ITEM);
    }

    #[test]
    fn test_fee_label_amount_fallback() {
        let hit = RAIL_AMOUNT_RULES.evaluate("中国铁路电子客票 票价: 99.50").unwrap();
        assert_eq!(hit.rule, "fee_label");
        assert_eq!(hit.value, dec!(99.50));
    }

    #[test]
    fn test_requires_both_markers() {
        assert!(!is_rail_ticket("中国铁路 票价 ￥20.00"));
        assert!(!is_rail_ticket("电子客票 ￥20.00"));
    }
}
