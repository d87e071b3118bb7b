//! The structured record extracted from one invoice document.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// One extracted invoice, keyed by the file it came from.
///
/// Every field other than `source_name` is `None` when its rule chain found
/// nothing. A populated field is always well-formed: dates are real calendar
/// dates and amounts are non-negative with two fractional digits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvoiceRecord {
    /// Identifier of the originating file, unique per run.
    pub source_name: String,

    /// Issue date (开票日期).
    #[serde(serialize_with = "serialize_issue_date")]
    pub issue_date: Option<NaiveDate>,

    /// Issuer-assigned invoice code (发票代码).
    pub invoice_code: Option<String>,

    /// Invoice number (发票号码).
    pub invoice_number: Option<String>,

    /// Short item description (商品名称).
    pub item_name: Option<String>,

    /// Amount in yuan (金额(小写)).
    #[serde(serialize_with = "serialize_amount")]
    pub amount: Option<Decimal>,
}

impl InvoiceRecord {
    /// Create a record with every field empty.
    pub fn empty(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            ..Self::default()
        }
    }

    /// True when no field could be determined.
    pub fn is_empty(&self) -> bool {
        self.issue_date.is_none()
            && self.invoice_code.is_none()
            && self.invoice_number.is_none()
            && self.item_name.is_none()
            && self.amount.is_none()
    }

    /// Issue date in its canonical `Y年MM月D日` form, or an empty string.
    pub fn issue_date_text(&self) -> String {
        self.issue_date.map(format_issue_date).unwrap_or_default()
    }

    /// Amount with two fractional digits, or an empty string.
    pub fn amount_text(&self) -> String {
        self.amount.map(format_amount).unwrap_or_default()
    }

    /// Names of the fields that stayed empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.issue_date.is_none() {
            missing.push("issue_date");
        }
        if self.invoice_code.is_none() {
            missing.push("invoice_code");
        }
        if self.invoice_number.is_none() {
            missing.push("invoice_number");
        }
        if self.item_name.is_none() {
            missing.push("item_name");
        }
        if self.amount.is_none() {
            missing.push("amount");
        }
        missing
    }
}

/// Format an issue date as `Y年MM月D日`.
///
/// The month is zero-padded and the day is not.
pub fn format_issue_date(date: NaiveDate) -> String {
    format!("{:04}年{:02}月{}日", date.year(), date.month(), date.day())
}

/// Format an amount with exactly two fractional digits.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

/// File name for a renamed copy of the source document:
/// `<Y>-<M>-<D>_<item>_<integer yuan>.<extension>`.
///
/// Returns `None` unless date, item name and amount are all present.
pub fn renamed_file_name(record: &InvoiceRecord, extension: &str) -> Option<String> {
    let date = record.issue_date?;
    let item = record.item_name.as_deref()?;
    let amount = record.amount?;

    Some(format!(
        "{}-{}-{}_{}_{}.{}",
        date.year(),
        date.month(),
        date.day(),
        sanitize_file_component(item),
        amount.trunc(),
        extension
    ))
}

fn sanitize_file_component(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

fn serialize_issue_date<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => s.serialize_str(&format_issue_date(*d)),
        None => s.serialize_none(),
    }
}

fn serialize_amount<S: Serializer>(amount: &Option<Decimal>, s: S) -> Result<S::Ok, S::Error> {
    match amount {
        Some(a) => s.serialize_str(&format_amount(*a)),
        None => s.serialize_none(),
    }
}
