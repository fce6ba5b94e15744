use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::Opportunity;
use crate::domain::exchange::ExchangeId;
use crate::domain::market::AggregatedQuoteSet;
use crate::shared::types::Ticker;

/// Filters applied to every pair
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Spread must be strictly above this, in percent
    pub min_spread_pct: Decimal,
    /// Quote volume an exchange must strictly exceed to be a candidate
    pub min_quote_volume: Decimal,
    pub min_exchange_count: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_spread_pct: dec!(0.05),
            min_quote_volume: dec!(100000),
            min_exchange_count: 3,
        }
    }
}

/// Find the opportunity for one pair, if any.
///
/// Exchanges whose quote volume does not exceed `min_quote_volume` are dropped
/// before the coverage check. Among the rest, the lowest ask is the buy side and
/// the highest bid the sell side; ties go to the exchange first in key order.
pub fn detect_pair(quotes: &AggregatedQuoteSet, config: &DetectorConfig) -> Option<Opportunity> {
    let liquid: Vec<(ExchangeId, &Ticker)> = quotes
        .quotes
        .iter()
        .filter(|(_, ticker)| ticker.quote_volume > config.min_quote_volume)
        .map(|(exchange, ticker)| (*exchange, ticker))
        .collect();

    if liquid.len() < config.min_exchange_count {
        debug!(
            "{}: {} liquid exchanges of {} reporting, need {}",
            quotes.pair,
            liquid.len(),
            quotes.exchange_count(),
            config.min_exchange_count
        );
        return None;
    }

    let mut buy: Option<(ExchangeId, &Ticker)> = None;
    let mut sell: Option<(ExchangeId, &Ticker)> = None;
    for (exchange, ticker) in &liquid {
        if ticker.ask > Decimal::ZERO && buy.map_or(true, |(_, best)| ticker.ask < best.ask) {
            buy = Some((*exchange, *ticker));
        }
        if ticker.bid > Decimal::ZERO && sell.map_or(true, |(_, best)| ticker.bid > best.bid) {
            sell = Some((*exchange, *ticker));
        }
    }
    let (buy_exchange, buy_ticker) = buy?;
    let (sell_exchange, sell_ticker) = sell?;

    let Some(spread_pct) = gross_spread_pct(buy_ticker.ask, sell_ticker.bid) else {
        debug!(
            "{}: spread between {} ask {} and {} bid {} is out of range",
            quotes.pair, buy_exchange, buy_ticker.ask, sell_exchange, sell_ticker.bid
        );
        return None;
    };
    if spread_pct <= config.min_spread_pct {
        debug!(
            "{}: spread {:.4}% ({} -> {}) below {}%",
            quotes.pair, spread_pct, buy_exchange, sell_exchange, config.min_spread_pct
        );
        return None;
    }

    Some(Opportunity {
        pair: quotes.pair.clone(),
        buy_exchange,
        sell_exchange,
        buy_price: buy_ticker.ask,
        sell_price: sell_ticker.bid,
        buy_volume: buy_ticker.quote_volume,
        sell_volume: sell_ticker.quote_volume,
        spread_pct,
        exchange_count: liquid.len(),
    })
}

/// `(bid - ask) / ask * 100`, or `None` when it does not fit in a `Decimal`
fn gross_spread_pct(ask: Decimal, bid: Decimal) -> Option<Decimal> {
    bid.checked_sub(ask)?.checked_div(ask)?.checked_mul(dec!(100))
}

/// Run the detector over every quote set, keeping input order
pub fn detect_all(quote_sets: &[AggregatedQuoteSet], config: &DetectorConfig) -> Vec<Opportunity> {
    quote_sets
        .iter()
        .filter_map(|quotes| detect_pair(quotes, config))
        .collect()
}
