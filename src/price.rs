//! Turning the text of a price element into a number.
//!
//! Page text is first rewritten so that the decimal point is `.` according to
//! the product's [`ThousandsSeparator`], then the first decimal-or-integer
//! token is parsed. Currency symbols and labels around the number are ignored.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::ThousandsSeparator;
use crate::utils::error::ExtractionError;

// At each position the decimal form is tried before the bare integer.
static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+\.[0-9]+|[0-9]+").unwrap());

/// Rewrites `text` so that `.` is the decimal point.
///
/// With [`ThousandsSeparator::Dot`] every `.` is a grouping mark and is
/// dropped, then `,` becomes the decimal point. With
/// [`ThousandsSeparator::Comma`] only `,` is turned into `.`, so a grouped
/// value such as `1,234.56` becomes `1.234.56`.
pub fn normalize_price_text(text: &str, separator: ThousandsSeparator) -> String {
    match separator {
        ThousandsSeparator::Dot => text.replace('.', "").replace(',', "."),
        ThousandsSeparator::Comma => text.replace(',', "."),
    }
}

/// Parses the first number found in already-normalized text.
///
/// A digit run too long to fit an `f64` yields `None` rather than infinity.
pub fn first_number(normalized: &str) -> Option<f64> {
    NUMBER_REGEX
        .find(normalized)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

pub fn parse_price(text: &str, separator: ThousandsSeparator) -> Result<f64, ExtractionError> {
    let normalized = normalize_price_text(text.trim(), separator);
    first_number(&normalized).ok_or_else(|| ExtractionError::NoNumericToken {
        text: text.trim().to_string(),
    })
}
