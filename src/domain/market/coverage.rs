use std::collections::BTreeMap;

use super::CycleSnapshots;
use crate::shared::types::CanonicalPair;

/// Number of exchanges listing each pair across the given snapshots
pub fn pair_coverage(snapshots: &CycleSnapshots) -> BTreeMap<CanonicalPair, usize> {
    let mut coverage = BTreeMap::new();
    for snapshot in snapshots.values() {
        for pair in snapshot.keys() {
            *coverage.entry(pair.clone()).or_insert(0) += 1;
        }
    }
    coverage
}

/// Pairs listed on at least `min_coverage` exchanges, ordered by base then quote
pub fn discover_pairs(snapshots: &CycleSnapshots, min_coverage: usize) -> Vec<CanonicalPair> {
    pair_coverage(snapshots)
        .into_iter()
        .filter(|(_, count)| *count >= min_coverage)
        .map(|(pair, _)| pair)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::exchange::ExchangeId;
    use crate::shared::types::{ExchangeSnapshot, Ticker};
    use rust_decimal_macros::dec;

    fn snapshot(symbols: &[&str]) -> ExchangeSnapshot {
        let ticker = Ticker::checked(dec!(1), dec!(1), dec!(1), dec!(1), dec!(1)).unwrap();
        symbols.iter().map(|s| (s.parse().unwrap(), ticker)).collect()
    }

    fn sample() -> CycleSnapshots {
        CycleSnapshots::from([
            (ExchangeId::Binance, snapshot(&["BTCUSDT", "ETHUSDT", "SOLUSDT"])),
            (ExchangeId::Bybit, snapshot(&["BTCUSDT", "ETHUSDT"])),
            (ExchangeId::Mexc, snapshot(&["ETHUSDT", "BTCUSDT", "PEPEUSDT"])),
            (ExchangeId::Htx, snapshot(&["SOLUSDT"])),
        ])
    }

    #[test]
    fn test_pair_coverage_counts_exchanges() {
        let coverage = pair_coverage(&sample());
        assert_eq!(coverage[&"BTCUSDT".parse::<CanonicalPair>().unwrap()], 3);
        assert_eq!(coverage[&"SOLUSDT".parse::<CanonicalPair>().unwrap()], 2);
        assert_eq!(coverage[&"PEPEUSDT".parse::<CanonicalPair>().unwrap()], 1);
    }

    #[test]
    fn test_discover_pairs_applies_threshold_and_sorts() {
        let pairs: Vec<String> = discover_pairs(&sample(), 3).iter().map(|p| p.symbol()).collect();
        assert_eq!(pairs, vec!["BTCUSDT", "ETHUSDT"]);

        assert_eq!(discover_pairs(&sample(), 1).len(), 4);
        assert!(discover_pairs(&CycleSnapshots::new(), 1).is_empty());
    }
}
