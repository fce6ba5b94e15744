//! Exchange domain - centralized exchange identities, adapters and symbol mapping

mod exchange_interface;
mod exchange_registry;
pub mod symbols;

pub use exchange_interface::ExchangeAdapter;
pub use exchange_registry::ExchangeRegistry;
pub use symbols::SymbolFormat;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::errors::AppError;

/// Supported exchanges.
///
/// Variants are declared in lexicographic order of their keys so the derived
/// `Ord` doubles as the deterministic iteration order used for tie-breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExchangeId {
    Binance,
    Bybit,
    GateIo,
    Htx,
    Mexc,
}

impl ExchangeId {
    pub const ALL: [ExchangeId; 5] = [
        ExchangeId::Binance,
        ExchangeId::Bybit,
        ExchangeId::GateIo,
        ExchangeId::Htx,
        ExchangeId::Mexc,
    ];

    /// Lowercase key used in configuration and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            ExchangeId::Binance => "binance",
            ExchangeId::Bybit => "bybit",
            ExchangeId::GateIo => "gateio",
            ExchangeId::Htx => "htx",
            ExchangeId::Mexc => "mexc",
        }
    }

    /// Human-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Binance => "Binance",
            ExchangeId::Bybit => "Bybit",
            ExchangeId::GateIo => "Gate.io",
            ExchangeId::Htx => "HTX",
            ExchangeId::Mexc => "MEXC",
        }
    }

    /// Native symbol spelling used by this exchange
    pub fn symbol_format(&self) -> SymbolFormat {
        match self {
            ExchangeId::Binance | ExchangeId::Bybit | ExchangeId::Mexc => SymbolFormat::Concatenated,
            ExchangeId::GateIo => SymbolFormat::Underscored,
            ExchangeId::Htx => SymbolFormat::Lowercase,
        }
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(ExchangeId::Binance),
            "bybit" => Ok(ExchangeId::Bybit),
            "gate" | "gateio" | "gate.io" => Ok(ExchangeId::GateIo),
            "htx" | "huobi" => Ok(ExchangeId::Htx),
            "mexc" => Ok(ExchangeId::Mexc),
            other => Err(AppError::UnsupportedExchange(other.to_string())),
        }
    }
}

impl TryFrom<String> for ExchangeId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExchangeId> for String {
    fn from(id: ExchangeId) -> Self {
        id.as_str().to_string()
    }
}
