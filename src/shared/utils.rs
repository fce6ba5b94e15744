//! Utility functions and helpers

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::str::FromStr;

/// Numeric field as exchanges send it: a JSON string (`"123.4"`) or a bare number (`123.4`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDecimal {
    Text(String),
    Number(serde_json::Number),
}

impl RawDecimal {
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            RawDecimal::Text(s) => parse_decimal(s),
            RawDecimal::Number(n) => parse_decimal(&n.to_string()),
        }
    }
}

/// Parse a decimal string, accepting scientific notation. Empty strings yield `None`.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Resolve an optional raw field into a decimal
pub fn field(raw: &Option<RawDecimal>) -> Option<Decimal> {
    raw.as_ref().and_then(RawDecimal::to_decimal)
}

/// Format a price with precision depending on its magnitude
pub fn format_price(price: Decimal) -> String {
    let dp = if price < dec!(0.01) {
        8
    } else if price < dec!(1) {
        6
    } else {
        4
    };
    format!("${:.*}", dp, price.round_dp(dp as u32))
}

/// Format a quote volume as `$NNNK` below one million and `$N.NM` above
pub fn format_volume(volume: Decimal) -> String {
    let value = volume.to_f64().unwrap_or_default();
    if value < 1_000_000.0 {
        format!("${:.0}K", value / 1_000.0)
    } else {
        format!("${:.1}M", value / 1_000_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("50000.12"), Some(dec!(50000.12)));
        assert_eq!(parse_decimal("1.5e-7"), Some(dec!(0.00000015)));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn test_raw_decimal_accepts_strings_and_numbers() {
        let values: Vec<RawDecimal> = serde_json::from_str(r#"["1.25", 2.5, 7]"#).unwrap();
        let parsed: Vec<Option<Decimal>> = values.iter().map(RawDecimal::to_decimal).collect();
        assert_eq!(parsed, vec![Some(dec!(1.25)), Some(dec!(2.5)), Some(dec!(7))]);
    }

    #[test]
    fn test_format_price_precision() {
        assert_eq!(format_price(dec!(0.00123456789)), "$0.00123457");
        assert_eq!(format_price(dec!(0.5)), "$0.500000");
        assert_eq!(format_price(dec!(49950)), "$49950.0000");
    }

    #[test]
    fn test_format_volume() {
        assert_eq!(format_volume(dec!(250000)), "$250K");
        assert_eq!(format_volume(dec!(5000000)), "$5.0M");
    }
}
