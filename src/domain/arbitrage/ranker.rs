use rust_decimal::Decimal;
use serde::Serialize;

use super::Opportunity;

/// Summary over one cycle's opportunities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadStats {
    pub count: usize,
    pub avg_spread: Decimal,
    pub max_spread: Decimal,
}

/// Order by spread, widest first. Equal spreads keep their input order.
pub fn rank(mut opportunities: Vec<Opportunity>) -> Vec<Opportunity> {
    opportunities.sort_by(|a, b| b.spread_pct.cmp(&a.spread_pct));
    opportunities
}

/// Count, mean and maximum spread; both are zero for an empty slice
pub fn summarize(opportunities: &[Opportunity]) -> SpreadStats {
    if opportunities.is_empty() {
        return SpreadStats {
            count: 0,
            avg_spread: Decimal::ZERO,
            max_spread: Decimal::ZERO,
        };
    }

    let count = Decimal::from(opportunities.len());
    let max_spread = opportunities
        .iter()
        .map(|o| o.spread_pct)
        .max()
        .unwrap_or_default();
    let avg_spread = match checked_total(opportunities.iter().map(|o| o.spread_pct)) {
        Some(total) => total / count,
        // Spreads near Decimal::MAX; average the scaled terms instead
        None => checked_total(opportunities.iter().map(|o| o.spread_pct / count)).unwrap_or(max_spread),
    };

    SpreadStats {
        count: opportunities.len(),
        avg_spread,
        max_spread,
    }
}

fn checked_total(mut values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    values.try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}
