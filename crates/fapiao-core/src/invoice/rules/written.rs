//! Written financial numerals (大写金额), e.g. `壹佰贰拾叁圆肆角伍分`.

use rust_decimal::Decimal;

use super::patterns::AMOUNT_WRITTEN;

/// A written amount found in the text, with its parsed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenAmount {
    /// The matched numeral text.
    pub source: String,
    /// Value in yuan.
    pub value: Decimal,
}

/// Value of a digit glyph (零..玖).
pub fn digit_value(c: char) -> Option<u64> {
    let value = match c {
        '零' => 0,
        '壹' => 1,
        '贰' => 2,
        '叁' => 3,
        '肆' => 4,
        '伍' => 5,
        '陆' => 6,
        '柒' => 7,
        '捌' => 8,
        '玖' => 9,
        _ => return None,
    };
    Some(value)
}

/// Multiplier of a positional unit glyph (拾, 佰, 仟).
pub fn unit_value(c: char) -> Option<u64> {
    match c {
        '拾' => Some(10),
        '佰' => Some(100),
        '仟' => Some(1000),
        _ => None,
    }
}

/// Parse the integer-yuan part of a written amount.
///
/// Digits accumulate into a pending value; a unit multiplies the pending
/// value (or 1 when none is pending, so `拾` alone is ten) and adds it to the
/// total. A trailing digit with no unit is added as-is. Other characters are
/// skipped.
pub fn parse_written_integer(s: &str) -> u64 {
    let mut total: u64 = 0;
    let mut pending: u64 = 0;

    for c in s.chars() {
        if let Some(d) = digit_value(c) {
            pending = pending.saturating_mul(10).saturating_add(d);
        } else if let Some(unit) = unit_value(c) {
            let digit = if pending == 0 { 1 } else { pending };
            total = total.saturating_add(digit.saturating_mul(unit));
            pending = 0;
        }
    }

    total.saturating_add(pending)
}

/// Combine the yuan part with the jiao (角) and optional fen (分) glyphs.
pub fn parse_written_parts(yuan: &str, jiao: char, fen: Option<char>) -> Option<Decimal> {
    let jiao = digit_value(jiao)?;
    let fen = match fen {
        Some(c) => digit_value(c)?,
        None => 0,
    };

    let yuan = Decimal::from(parse_written_integer(yuan));
    Some(yuan + Decimal::new(jiao as i64, 1) + Decimal::new(fen as i64, 2))
}

/// Find and parse the first written amount in the text.
pub fn find_written_amount(text: &str) -> Option<WrittenAmount> {
    let caps = AMOUNT_WRITTEN.captures(text)?;
    let jiao = caps[2].chars().next()?;
    let fen = caps.get(3).and_then(|m| m.as_str().chars().next());

    let value = parse_written_parts(&caps[1], jiao, fen)?;
    Some(WrittenAmount {
        source: caps[0].trim().to_string(),
        value,
    })
}
