//! Common regex patterns for Chinese invoice extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Label text for the issue date (开票日期).
pub const ISSUE_DATE_LABEL: &str = "开票日期";
/// Label text for the invoice code (发票代码).
pub const INVOICE_CODE_LABEL: &str = "发票代码";
/// Label text for the invoice number (发票号码).
pub const INVOICE_NUMBER_LABEL: &str = "发票号码";
/// Canonical marker in front of the digit-form amount.
pub const SMALL_WRITING_MARKER: &str = "(小写)";

/// Goods marker for fuel sales.
pub const FUEL_MARKER: &str = "汽油";
/// Goods marker for catering.
pub const CATERING_MARKER: &str = "餐饮";

/// Carrier marker on rail tickets.
pub const RAIL_CARRIER_MARKER: &str = "中国铁路";
/// Document-type marker on rail tickets.
pub const E_TICKET_MARKER: &str = "电子客票";

lazy_static! {
    // Labels split apart by stray whitespace, e.g. "发 票 号 码 ："
    pub static ref ISSUE_DATE_LABEL_LOOSE: Regex = Regex::new(
        r"开\s*票\s*日\s*期\s*[:：]?"
    ).unwrap();

    pub static ref INVOICE_CODE_LABEL_LOOSE: Regex = Regex::new(
        r"发\s*票\s*代\s*码\s*[:：]?"
    ).unwrap();

    pub static ref INVOICE_NUMBER_LABEL_LOOSE: Regex = Regex::new(
        r"发\s*票\s*号\s*码\s*[:：]?"
    ).unwrap();

    pub static ref SMALL_WRITING_LOOSE: Regex = Regex::new(
        r"[（(]\s*小\s*写\s*[)）]"
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    pub static ref DIGIT_RUN: Regex = Regex::new(r"[0-9]+").unwrap();

    // Issue dates
    pub static ref DATE_LABELED: Regex = Regex::new(
        r"开票日期[:：]?\s*([0-9]{4})\s*年\s*([0-9]{1,2})\s*月\s*([0-9]{1,2})\s*日"
    ).unwrap();

    pub static ref DATE_CJK: Regex = Regex::new(
        r"([0-9]{4})\s*年\s*([0-9]{1,2})\s*月\s*([0-9]{1,2})\s*日"
    ).unwrap();

    // Digit isolation is checked by the caller; the regex crate has no lookaround.
    pub static ref DATE_SPACED: Regex = Regex::new(
        r"([0-9]{4})\s+([0-9]{1,2})\s+([0-9]{1,2})"
    ).unwrap();

    // Invoice code and number
    pub static ref INVOICE_CODE: Regex = Regex::new(
        r"发票代码[:：]?\s*([0-9A-Za-z]+)"
    ).unwrap();

    pub static ref INVOICE_NUMBER: Regex = Regex::new(
        r"发票号码[:：]?\s*([0-9A-Za-z]+)"
    ).unwrap();

    // Number printed beside the supervision seal (全国统一发票监制章)
    pub static ref INVOICE_NUMBER_SEAL: Regex = Regex::new(
        r"发票监[^0-9]*([0-9]{6,})"
    ).unwrap();

    // Item names, e.g. "*餐饮服务*餐饮服务费"
    pub static ref ITEM_DELIMITED: Regex = Regex::new(
        r"[*＊][^*＊]*[*＊]([^*＊\n]+)"
    ).unwrap();

    pub static ref ITEM_IDEOGRAPHIC: Regex = Regex::new(
        r"[\u{4e00}-\u{9fa5}]{2,}(?:服务|费|项目)?"
    ).unwrap();

    pub static ref IDEOGRAPH: Regex = Regex::new(r"[\u{4e00}-\u{9fa5}]").unwrap();

    // Amounts. OCR often reads the yuan sign as '?'.
    pub static ref AMOUNT_SMALL_WRITING: Regex = Regex::new(
        r"[（(]\s*小写\s*[)）]\s*[¥￥?？]?\s*([0-9.,]+)"
    ).unwrap();

    pub static ref AMOUNT_WRITTEN: Regex = Regex::new(
        r"[¥￥]?\s*([零壹贰叁肆伍陆柒捌玖拾佰仟]+)[圆圓元]([零壹贰叁肆伍陆柒捌玖])角(?:([零壹贰叁肆伍陆柒捌玖])分)?"
    ).unwrap();

    // Rail e-tickets
    pub static ref RAIL_AMOUNT: Regex = Regex::new(
        r"[￥¥]\s*([0-9.,]+)"
    ).unwrap();

    pub static ref RAIL_FEE_LABEL: Regex = Regex::new(
        r"(改签费|退票费|票价)"
    ).unwrap();

    pub static ref RAIL_FEE_AMOUNT: Regex = Regex::new(
        r"(?:改签费|退票费|票价)[:：]?\s*[¥￥?？]?\s*([0-9.,]+)"
    ).unwrap();
}
