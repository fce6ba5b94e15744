//! Mapping between canonical pairs and exchange-native symbol spellings.
//!
//! The mappings are pure and stateless. Native symbols outside an exchange's
//! own format (wrong case, wrong separator, unsupported quote asset) map to
//! `None` and are left out of the canonical universe.

use super::ExchangeId;
use crate::shared::types::{CanonicalPair, QuoteAsset};

/// How an exchange spells a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolFormat {
    /// `BTCUSDT`
    Concatenated,
    /// `BTC_USDT`
    Underscored,
    /// `btcusdt`
    Lowercase,
}

impl SymbolFormat {
    pub fn to_native(&self, pair: &CanonicalPair) -> String {
        match self {
            SymbolFormat::Concatenated => format!("{}{}", pair.base(), pair.quote().as_str()),
            SymbolFormat::Underscored => format!("{}_{}", pair.base(), pair.quote().as_str()),
            SymbolFormat::Lowercase => format!("{}{}", pair.base(), pair.quote().as_str()).to_ascii_lowercase(),
        }
    }

    pub fn from_native(&self, native: &str) -> Option<CanonicalPair> {
        match self {
            SymbolFormat::Concatenated => {
                if has_lowercase(native) {
                    return None;
                }
                let (base, quote) = QuoteAsset::split_suffix(native)?;
                CanonicalPair::new(base, quote).ok()
            }
            SymbolFormat::Underscored => {
                if has_lowercase(native) {
                    return None;
                }
                let (base, quote) = native.split_once('_')?;
                let quote = QuoteAsset::ALL.iter().copied().find(|q| q.as_str() == quote)?;
                CanonicalPair::new(base, quote).ok()
            }
            SymbolFormat::Lowercase => {
                if native.chars().any(|c| c.is_ascii_uppercase()) {
                    return None;
                }
                let upper = native.to_ascii_uppercase();
                let (base, quote) = QuoteAsset::split_suffix(&upper)?;
                CanonicalPair::new(base, quote).ok()
            }
        }
    }
}

fn has_lowercase(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_lowercase())
}

impl ExchangeId {
    /// Native symbol for `pair` on this exchange
    pub fn to_native(&self, pair: &CanonicalPair) -> String {
        self.symbol_format().to_native(pair)
    }

    /// Canonical pair for a native symbol, if it belongs to the supported universe
    pub fn from_native(&self, native: &str) -> Option<CanonicalPair> {
        self.symbol_format().from_native(native)
    }
}
