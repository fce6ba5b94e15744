// src/report.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;

use crate::domain::arbitrage::{summarize, Opportunity, SpreadStats};
use crate::shared::utils::{format_price, format_volume};

/// Result of one monitoring cycle, as handed to the reporting layer
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// Ranked, widest spread first
    pub opportunities: Vec<Opportunity>,
    pub stats: CycleStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleStats {
    #[serde(flatten)]
    pub spread: SpreadStats,
    pub timestamp: DateTime<Utc>,
    pub pairs_analyzed: usize,
    pub exchanges_requested: usize,
    pub exchanges_responded: usize,
    pub elapsed_ms: u64,
}

/// Cycle facts that do not come from the opportunities themselves
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleMeta {
    pub pairs_analyzed: usize,
    pub exchanges_requested: usize,
    pub exchanges_responded: usize,
    pub elapsed: Duration,
}

impl CycleReport {
    pub fn new(opportunities: Vec<Opportunity>, meta: CycleMeta) -> Self {
        let spread = summarize(&opportunities);
        Self {
            opportunities,
            stats: CycleStats {
                spread,
                timestamp: Utc::now(),
                pairs_analyzed: meta.pairs_analyzed,
                exchanges_requested: meta.exchanges_requested,
                exchanges_responded: meta.exchanges_responded,
                elapsed_ms: u64::try_from(meta.elapsed.as_millis()).unwrap_or(u64::MAX),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Console table of the opportunities followed by the summary line
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let stats = &self.stats;

        if self.is_empty() {
            let _ = writeln!(
                out,
                "No arbitrage opportunities found ({} pairs, {}/{} exchanges responded)",
                stats.pairs_analyzed, stats.exchanges_responded, stats.exchanges_requested
            );
            return out;
        }

        let _ = writeln!(
            out,
            "{:<4} {:<12} {:>8}  {:<8} {:>16}  {:<8} {:>16}  {:>9} {:>9}  {:>4}",
            "#", "PAIR", "SPREAD", "BUY ON", "BUY PRICE", "SELL ON", "SELL PRICE", "BUY VOL", "SELL VOL", "EXCH"
        );
        let _ = writeln!(out, "{}", "-".repeat(112));
        for (i, o) in self.opportunities.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:<4} {:<12} {:>7}%  {:<8} {:>16}  {:<8} {:>16}  {:>9} {:>9}  {:>4}",
                i + 1,
                o.pair.to_string(),
                format!("{:.4}", o.spread_pct.round_dp(4)),
                o.buy_exchange.to_string(),
                format_price(o.buy_price),
                o.sell_exchange.to_string(),
                format_price(o.sell_price),
                format_volume(o.buy_volume),
                format_volume(o.sell_volume),
                o.exchange_count
            );
        }
        let _ = writeln!(out, "{}", "-".repeat(112));
        let _ = writeln!(
            out,
            "Opportunities: {} | avg spread: {:.4}% | max spread: {:.4}% | {}/{} exchanges | {} pairs | {}ms",
            stats.spread.count,
            stats.spread.avg_spread.round_dp(4),
            stats.spread.max_spread.round_dp(4),
            stats.exchanges_responded,
            stats.exchanges_requested,
            stats.pairs_analyzed,
            stats.elapsed_ms
        );
        out
    }
}
