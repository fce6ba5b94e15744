//! Error handling for the application

use thiserror::Error;

/// Exchange-related errors.
///
/// Produced at the adapter boundary and contained by the fetch coordinator,
/// which turns them into "no data from this exchange this cycle".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("{exchange}: transport error: {message}")]
    Transport { exchange: String, message: String },

    #[error("{exchange}: request timed out")]
    Timeout { exchange: String },

    #[error("{exchange}: HTTP status {status}")]
    Status { exchange: String, status: u16 },

    #[error("{exchange}: malformed response: {message}")]
    Malformed { exchange: String, message: String },

    #[error("{exchange}: API error: {message}")]
    Api { exchange: String, message: String },
}

impl ExchangeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExchangeError::Timeout { .. })
    }
}

/// Symbol-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("Empty pair symbol")]
    Empty,

    #[error("Invalid characters in pair symbol: {0}")]
    InvalidCharacters(String),

    #[error("Unsupported quote asset in pair: {0}")]
    UnsupportedQuote(String),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Exchange not supported: {0}")]
    UnsupportedExchange(String),

    #[error("Invalid pair: {0}")]
    InvalidPair(#[from] SymbolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
