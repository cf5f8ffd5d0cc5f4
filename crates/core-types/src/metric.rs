use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// A numeric performance field exactly as the producer stored it.
///
/// External feeds are not consistent about types: the same field may arrive as a JSON
/// number on one account and as a string on another. The raw value is preserved so a
/// stored record round-trips unchanged, and consumers that need arithmetic call
/// [`Metric::to_decimal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metric {
    Number(f64),
    Text(String),
    Other(Value),
}

impl Metric {
    /// Coerces the raw value into a decimal.
    ///
    /// Numbers are taken as-is, plain numeric strings (`-12.5`, `1e3`) are parsed, and
    /// everything else (blank strings, `1_000`, booleans, objects, non-finite floats) is
    /// `None`. `Decimal` spans roughly ±7.9e28 with 28 fractional digits: larger finite
    /// values saturate to `Decimal::MAX`/`Decimal::MIN`, smaller ones round towards zero,
    /// so an extreme value still ranks on the correct side of every other.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Metric::Number(n) if n.is_finite() => Some(saturating_from_f64(*n)),
            Metric::Number(_) => None,
            Metric::Text(s) => parse_decimal(s),
            Metric::Other(_) => None,
        }
    }
}

impl From<f64> for Metric {
    fn from(value: f64) -> Self {
        Metric::Number(value)
    }
}

impl From<&str> for Metric {
    fn from(value: &str) -> Self {
        Metric::Text(value.to_string())
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if !is_plain_number(trimmed) {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().map(saturating_from_f64))
}

/// `[+-]digits[.digits][(e|E)[+-]digits]`, with digits on at least one side of the point.
fn is_plain_number(s: &str) -> bool {
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (unsigned, None),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if (whole.is_empty() && fraction.is_empty()) || !digits(whole) || !digits(fraction) {
        return false;
    }
    match exponent {
        Some(exponent) => {
            let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
            !exponent.is_empty() && digits(exponent)
        }
        None => true,
    }
}

/// Never NaN: callers only pass finite values or the infinities a huge literal parses to.
fn saturating_from_f64(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(if value.abs() < 1.0 {
        Decimal::ZERO
    } else if value.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

/// Coerces an optional raw field, treating a missing field and an unparsable one alike.
pub fn coerce(metric: Option<&Metric>) -> Option<Decimal> {
    metric.and_then(Metric::to_decimal)
}
