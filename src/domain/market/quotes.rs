use std::collections::BTreeMap;

use super::CycleSnapshots;
use crate::domain::exchange::ExchangeId;
use crate::shared::types::{CanonicalPair, Ticker};

/// Quotes for one pair across every exchange that reported it this cycle.
///
/// Exchanges that did not list the pair, or whose fetch failed, are absent;
/// they are never filled in with zero prices.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedQuoteSet {
    pub pair: CanonicalPair,
    /// Iterates in exchange key order
    pub quotes: BTreeMap<ExchangeId, Ticker>,
}

impl AggregatedQuoteSet {
    pub fn new(pair: CanonicalPair) -> Self {
        Self {
            pair,
            quotes: BTreeMap::new(),
        }
    }

    pub fn with_quote(mut self, exchange: ExchangeId, ticker: Ticker) -> Self {
        self.quotes.insert(exchange, ticker);
        self
    }

    pub fn exchange_count(&self) -> usize {
        self.quotes.len()
    }
}

/// Join snapshots on pair key, one quote set per requested pair, in request order
pub fn aggregate(snapshots: &CycleSnapshots, pairs: &[CanonicalPair]) -> Vec<AggregatedQuoteSet> {
    pairs
        .iter()
        .map(|pair| {
            snapshots
                .iter()
                .filter_map(|(exchange, snapshot)| snapshot.get(pair).map(|t| (*exchange, *t)))
                .fold(AggregatedQuoteSet::new(pair.clone()), |set, (exchange, ticker)| {
                    set.with_quote(exchange, ticker)
                })
        })
        .collect()
}
