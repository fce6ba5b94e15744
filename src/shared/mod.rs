//! Shared components - common types, errors, and utilities

pub mod types;
pub mod errors;
pub mod utils;

pub use errors::{AppError, ExchangeError, SymbolError};
pub use types::{CanonicalPair, ExchangeSnapshot, QuoteAsset, Ticker};
