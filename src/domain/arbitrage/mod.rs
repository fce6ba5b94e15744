//! Arbitrage domain - cross-exchange spread detection and ranking

pub mod opportunity_detector;
pub mod ranker;

pub use opportunity_detector::{detect_all, detect_pair, DetectorConfig};
pub use ranker::{rank, summarize, SpreadStats};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::exchange::ExchangeId;
use crate::shared::types::CanonicalPair;

/// Gross cross-exchange spread for one pair: buy at the best ask, sell at the best bid.
///
/// Fees and withdrawal costs are not deducted; `spread_pct` is not net profit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub pair: CanonicalPair,
    pub buy_exchange: ExchangeId,
    pub sell_exchange: ExchangeId,
    /// Best ask on the buy exchange
    pub buy_price: Decimal,
    /// Best bid on the sell exchange
    pub sell_price: Decimal,
    /// Quote volume of the buy exchange
    pub buy_volume: Decimal,
    /// Quote volume of the sell exchange
    pub sell_volume: Decimal,
    pub spread_pct: Decimal,
    /// Liquid exchanges that quoted the pair this cycle
    pub exchange_count: usize,
}
