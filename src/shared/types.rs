//! Common types used across the application

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::shared::errors::SymbolError;

/// Quote assets a canonical pair may be denominated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuoteAsset {
    Usdt,
    Usdc,
}

impl QuoteAsset {
    pub const ALL: [QuoteAsset; 2] = [QuoteAsset::Usdt, QuoteAsset::Usdc];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteAsset::Usdt => "USDT",
            QuoteAsset::Usdc => "USDC",
        }
    }

    /// Find the quote asset that terminates `symbol`, leaving a non-empty base.
    pub fn split_suffix(symbol: &str) -> Option<(&str, QuoteAsset)> {
        Self::ALL.iter().find_map(|quote| {
            symbol
                .strip_suffix(quote.as_str())
                .filter(|base| !base.is_empty())
                .map(|base| (base, *quote))
        })
    }
}

impl fmt::Display for QuoteAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteAsset {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|quote| quote.as_str() == upper)
            .ok_or(SymbolError::UnsupportedQuote(upper))
    }
}

/// Venue-independent pair identifier, rendered as uppercase `BASEQUOTE` (e.g. `BTCUSDT`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalPair {
    base: String,
    quote: QuoteAsset,
}

impl CanonicalPair {
    pub fn new(base: &str, quote: QuoteAsset) -> Result<Self, SymbolError> {
        let base = base.trim().to_ascii_uppercase();
        if base.is_empty() {
            return Err(SymbolError::Empty);
        }
        if !base.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SymbolError::InvalidCharacters(base));
        }
        Ok(Self { base, quote })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> QuoteAsset {
        self.quote
    }

    pub fn symbol(&self) -> String {
        format!("{}{}", self.base, self.quote.as_str())
    }
}

impl fmt::Display for CanonicalPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.quote.as_str())
    }
}

impl FromStr for CanonicalPair {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbol = s.trim().to_ascii_uppercase();
        if symbol.is_empty() {
            return Err(SymbolError::Empty);
        }
        if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SymbolError::InvalidCharacters(symbol));
        }
        let (base, quote) =
            QuoteAsset::split_suffix(&symbol).ok_or_else(|| SymbolError::UnsupportedQuote(symbol.clone()))?;
        Self::new(base, quote)
    }
}

impl TryFrom<String> for CanonicalPair {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CanonicalPair> for String {
    fn from(pair: CanonicalPair) -> Self {
        pair.to_string()
    }
}

/// Best bid/ask and 24h volume reported by one exchange for one pair.
///
/// `bid <= ask` is not guaranteed: stale or crossed books are passed through as reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    pub last_price: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    pub base_volume: Decimal,
    /// Traded volume in the quote asset; the liquidity figure used for filtering.
    pub quote_volume: Decimal,
}

impl Ticker {
    /// Build a ticker, rejecting negative fields.
    pub fn checked(
        last_price: Decimal,
        bid: Decimal,
        ask: Decimal,
        base_volume: Decimal,
        quote_volume: Decimal,
    ) -> Option<Self> {
        let fields = [last_price, bid, ask, base_volume, quote_volume];
        if fields.iter().any(|v| v.is_sign_negative() && !v.is_zero()) {
            return None;
        }
        Some(Self {
            last_price,
            bid,
            ask,
            base_volume,
            quote_volume,
        })
    }
}

/// Tickers returned by one exchange for one fetch cycle, keyed by canonical pair.
pub type ExchangeSnapshot = HashMap<CanonicalPair, Ticker>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_canonical_pair() {
        let pair: CanonicalPair = "btcusdt".parse().unwrap();
        assert_eq!(pair.base(), "BTC");
        assert_eq!(pair.quote(), QuoteAsset::Usdt);
        assert_eq!(pair.to_string(), "BTCUSDT");

        let pair: CanonicalPair = " 1INCHUSDC ".parse().unwrap();
        assert_eq!(pair.base(), "1INCH");
        assert_eq!(pair.quote(), QuoteAsset::Usdc);
    }

    #[test]
    fn test_parse_canonical_pair_rejects_invalid() {
        assert_eq!("".parse::<CanonicalPair>(), Err(SymbolError::Empty));
        assert_eq!("USDT".parse::<CanonicalPair>(), Err(SymbolError::UnsupportedQuote("USDT".into())));
        assert_eq!("ETHBTC".parse::<CanonicalPair>(), Err(SymbolError::UnsupportedQuote("ETHBTC".into())));
        assert!(matches!("BTC_USDT".parse::<CanonicalPair>(), Err(SymbolError::InvalidCharacters(_))));
    }

    #[test]
    fn test_canonical_pair_serde_as_string() {
        let pair: CanonicalPair = "ETHUSDT".parse().unwrap();
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, "\"ETHUSDT\"");
        let back: CanonicalPair = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pair);
        assert!(serde_json::from_str::<CanonicalPair>("\"ETH-BTC\"").is_err());
    }

    #[test]
    fn test_ticker_rejects_negative_fields() {
        assert!(Ticker::checked(dec!(1), dec!(1), dec!(1), dec!(0), dec!(0)).is_some());
        assert!(Ticker::checked(dec!(1), dec!(-1), dec!(1), dec!(0), dec!(0)).is_none());
    }
}
