//! Lenient value parsers for source attributes.
//!
//! Source figures arrive as JSON numbers or as strings with thousands
//! separators, stray whitespace, and trailing unit text (`"1,755.97"`,
//! `"120 ล้านบาท"`). Every parser returns `None` instead of failing; the
//! caller substitutes its documented default.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Longest leading decimal number, optionally signed, with optional exponent.
static LEADING_FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?").expect("valid regex")
});

/// Longest leading integer, optionally signed.
static LEADING_INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+").expect("valid regex"));

/// Removes thousands separators and all whitespace.
#[must_use]
pub fn strip_separators(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect()
}

/// Parses the leading decimal number of a string. Trailing text is
/// ignored; non-finite results are rejected.
#[must_use]
pub fn parse_leading_float(raw: &str) -> Option<f64> {
    LEADING_FLOAT_RE
        .find(raw)?
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parses the leading integer of a string. Trailing text is ignored.
#[must_use]
pub fn parse_leading_integer(raw: &str) -> Option<i64> {
    LEADING_INTEGER_RE.find(raw)?.as_str().parse::<i64>().ok()
}

/// Non-empty trimmed text. Numbers are rendered as text so numeric codes
/// still work as identifiers.
#[must_use]
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A signed decimal figure after stripping separators and whitespace.
#[must_use]
pub fn amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_leading_float(&strip_separators(s)),
        _ => None,
    }
}

/// A non-negative head count.
#[must_use]
pub fn count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            n.as_f64()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64)
        }),
        Value::String(s) => {
            parse_leading_integer(&strip_separators(s)).and_then(|v| u64::try_from(v).ok())
        }
        _ => None,
    }
}

/// A revenue figure in millions. Everything except digits and `.` is
/// dropped before parsing, so the result is never negative.
#[must_use]
pub fn millions(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(f64::abs),
        Value::String(s) => {
            let digits: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            parse_leading_float(&digits)
        }
        _ => None,
    }
}
