//! Rule-based field extractors for Chinese invoices.
//!
//! Each field is resolved by a [`RuleChain`]: an ordered list of pure
//! `text -> Option<value>` rules. Rules run in order and the first one that
//! yields a value wins.

pub mod amounts;
pub mod dates;
pub mod identifiers;
pub mod items;
pub mod patterns;
pub mod railway;
pub mod written;

pub use amounts::{
    amount_after_label, parse_digit_amount, reconcile_amount, AmountSource, Reconciliation,
    DIGIT_AMOUNT_RULES,
};
pub use dates::{parse_ymd, ISSUE_DATE_RULES};
pub use identifiers::{INVOICE_CODE_RULES, INVOICE_NUMBER_RULES};
pub use items::{item_candidate, ITEM_NAME_RULES};
pub use railway::{extract_rail_ticket, is_rail_ticket, RailTicketFields};
pub use written::{find_written_amount, parse_written_integer, WrittenAmount};

use regex::Regex;
use tracing::trace;

/// A single named extraction rule.
#[derive(Clone, Copy)]
pub struct FieldRule<T> {
    /// Short rule name, used in logs and extraction results.
    pub name: &'static str,
    /// The rule itself.
    pub apply: fn(&str) -> Option<T>,
}

/// Ordered, first-match-wins rules for one field.
#[derive(Clone, Copy)]
pub struct RuleChain<T: 'static> {
    field: &'static str,
    rules: &'static [FieldRule<T>],
}

/// A value produced by a rule chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Name of the rule that produced it.
    pub rule: &'static str,
}

impl<T: 'static> RuleChain<T> {
    pub const fn new(field: &'static str, rules: &'static [FieldRule<T>]) -> Self {
        Self { field, rules }
    }

    /// Field name this chain resolves.
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Rule names in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    /// Run the rules in order and return the first hit.
    pub fn evaluate(&self, text: &str) -> Option<RuleMatch<T>> {
        for rule in self.rules {
            if let Some(value) = (rule.apply)(text) {
                trace!("{}: matched by rule '{}'", self.field, rule.name);
                return Some(RuleMatch { value, rule: rule.name });
            }
        }
        trace!("{}: no rule matched", self.field);
        None
    }

    /// Like [`evaluate`](Self::evaluate), dropping the rule name.
    pub fn extract(&self, text: &str) -> Option<T> {
        self.evaluate(text).map(|m| m.value)
    }
}

/// Matches of `re` whose ASCII digit runs are not glued to further digits
/// on either side, trying every start position in order.
///
/// This stands in for `(?<!\d)...(?!\d)`, which the regex crate does not
/// support. Matches are produced lazily, so `find_map` and friends stop
/// scanning at the first accepted one.
pub(crate) fn digit_isolated_captures<'r, 't>(
    re: &'r Regex,
    text: &'t str,
) -> impl Iterator<Item = regex::Captures<'t>> + 'r
where
    't: 'r,
{
    let glued = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit());
    let mut pos = 0;

    std::iter::from_fn(move || {
        while pos <= text.len() {
            let caps = re.captures_at(text, pos)?;
            let whole = caps.get(0)?;

            let before = text[..whole.start()].chars().next_back();
            let after = text[whole.end()..].chars().next();
            pos = whole.start() + text[whole.start()..].chars().next().map_or(1, char::len_utf8);

            if !glued(before) && !glued(after) {
                return Some(caps);
            }
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always_none(_: &str) -> Option<u32> {
        None
    }

    fn length(text: &str) -> Option<u32> {
        Some(text.len() as u32)
    }

    fn never_reached(_: &str) -> Option<u32> {
        Some(0)
    }

    const CHAIN: RuleChain<u32> = RuleChain::new(
        "test",
        &[
            FieldRule { name: "none", apply: always_none },
            FieldRule { name: "length", apply: length },
            FieldRule { name: "zero", apply: never_reached },
        ],
    );

    #[test]
    fn test_first_match_wins() {
        let hit = CHAIN.evaluate("abc").unwrap();
        assert_eq!(hit, RuleMatch { value: 3, rule: "length" });
        assert_eq!(CHAIN.rule_names(), vec!["none", "length", "zero"]);
    }

    #[test]
    fn test_digit_isolation_retries_inside_rejected_match() {
        let re = Regex::new(r"([0-9]{4})\s+([0-9]{1,2})\s+([0-9]{1,2})").unwrap();

        // "2024 1 19" is glued to the next digit, but "1999 2 3" inside it is fine.
        let caps: Vec<_> = digit_isolated_captures(&re, "2024 1 1999 2 3").collect();
        assert_eq!(caps.len(), 1);
        assert_eq!(&caps[0][1], "1999");

        assert!(digit_isolated_captures(&re, "12024 1 5").next().is_none());
    }

    #[test]
    fn test_digit_isolation_stops_at_first_accepted_match() {
        let re = Regex::new(r"[0-9]{2}").unwrap();
        let text = format!("12 {}", "3 ".repeat(10_000));

        let mut matches = digit_isolated_captures(&re, &text);
        assert_eq!(&matches.next().unwrap()[0], "12");
        assert!(matches.next().is_none());
    }
}
