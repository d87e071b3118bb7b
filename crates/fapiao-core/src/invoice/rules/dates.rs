//! Issue date extraction.

use chrono::NaiveDate;

use super::patterns::{DATE_CJK, DATE_LABELED, DATE_SPACED};
use super::{digit_isolated_captures, FieldRule, RuleChain};

/// Issue date rules, in priority order.
pub const ISSUE_DATE_RULES: RuleChain<NaiveDate> = RuleChain::new(
    "issue_date",
    &[
        FieldRule { name: "labeled", apply: labeled_date },
        FieldRule { name: "cjk", apply: cjk_date },
        FieldRule { name: "spaced", apply: spaced_date },
    ],
);

/// Date right after the `开票日期` label.
fn labeled_date(text: &str) -> Option<NaiveDate> {
    DATE_LABELED
        .captures_iter(text)
        .find_map(|caps| parse_ymd(&caps[1], &caps[2], &caps[3]))
}

/// Any `YYYY年M月D日` token.
fn cjk_date(text: &str) -> Option<NaiveDate> {
    DATE_CJK
        .captures_iter(text)
        .find_map(|caps| parse_ymd(&caps[1], &caps[2], &caps[3]))
}

/// A bare `YYYY M D` digit triple, as left behind when OCR drops the
/// 年/月/日 glyphs.
fn spaced_date(text: &str) -> Option<NaiveDate> {
    digit_isolated_captures(&DATE_SPACED, text)
        .find_map(|caps| parse_ymd(&caps[1], &caps[2], &caps[3]))
}

/// Build a calendar date from digit strings. Impossible dates give `None`.
pub fn parse_ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
