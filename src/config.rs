use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::fs;
use std::time::Duration;

use crate::application::arbitrage_monitor::MonitorSettings;
use crate::application::fetch_coordinator::{CoordinatorConfig, FetchMode};
use crate::domain::arbitrage::DetectorConfig;
use crate::domain::exchange::ExchangeId;
use crate::shared::errors::AppError;
use crate::shared::types::CanonicalPair;
use crate::shared::utils::parse_decimal;

const DEFAULT_PAIRS: [&str; 5] = ["BTCUSDT", "ETHUSDT", "BNBUSDT", "SOLUSDT", "ADAUSDT"];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScannerCfg {
    pub exchanges: Vec<String>,
    pub pairs: Vec<String>,
    /// Pair list file; takes precedence over `pairs` when set
    pub pairs_file: Option<PathBuf>,
    pub fetch_mode: FetchMode,
    pub max_concurrency: usize,
}

impl Default for ScannerCfg {
    fn default() -> Self {
        Self {
            exchanges: ExchangeId::ALL.iter().map(|e| e.key().to_string()).collect(),
            pairs: DEFAULT_PAIRS.iter().map(|p| p.to_string()).collect(),
            pairs_file: None,
            fetch_mode: FetchMode::AllTickers,
            max_concurrency: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThresholdsCfg {
    pub min_spread_pct: f64,
    pub min_quote_volume: f64,
    pub min_exchange_count: usize,
}

impl Default for ThresholdsCfg {
    fn default() -> Self {
        Self {
            min_spread_pct: 0.05,
            min_quote_volume: 100_000.0,
            min_exchange_count: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutsCfg {
    pub per_request_timeout_seconds: f64,
    pub cycle_timeout_seconds: f64,
}

impl Default for TimeoutsCfg {
    fn default() -> Self {
        Self {
            per_request_timeout_seconds: 10.0,
            cycle_timeout_seconds: 15.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorCfg {
    pub poll_interval_seconds: f64,
    pub cache_ttl_seconds: f64,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 30.0,
            cache_ttl_seconds: 30.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scanner: ScannerCfg,
    pub thresholds: ThresholdsCfg,
    pub timeouts: TimeoutsCfg,
    pub monitor: MonitorCfg,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Self = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(cfg)
    }

    pub fn exchange_ids(&self) -> Result<Vec<ExchangeId>, AppError> {
        if self.scanner.exchanges.is_empty() {
            return Err(AppError::ConfigError("scanner.exchanges is empty".to_string()));
        }
        self.scanner.exchanges.iter().map(|name| name.parse()).collect()
    }

    /// Pairs from `pairs_file` if set, otherwise from `pairs`
    pub fn load_pairs(&self) -> Result<Vec<CanonicalPair>, AppError> {
        let pairs = match &self.scanner.pairs_file {
            Some(path) => parse_pairs_list(&fs::read_to_string(path)?)?,
            None => dedup_pairs(self.scanner.pairs.iter().map(String::as_str))?,
        };
        if pairs.is_empty() {
            return Err(AppError::ConfigError("pair list is empty".to_string()));
        }
        Ok(pairs)
    }

    pub fn detector_config(&self) -> Result<DetectorConfig, AppError> {
        let t = &self.thresholds;
        let min_spread_pct = non_negative_decimal("thresholds.min_spread_pct", t.min_spread_pct)?;
        let min_quote_volume = non_negative_decimal("thresholds.min_quote_volume", t.min_quote_volume)?;
        if t.min_exchange_count < 2 {
            return Err(AppError::ConfigError(format!(
                "thresholds.min_exchange_count must be at least 2, got {}",
                t.min_exchange_count
            )));
        }
        Ok(DetectorConfig {
            min_spread_pct,
            min_quote_volume,
            min_exchange_count: t.min_exchange_count,
        })
    }

    pub fn coordinator_config(&self) -> Result<CoordinatorConfig, AppError> {
        if self.scanner.max_concurrency == 0 {
            return Err(AppError::ConfigError("scanner.max_concurrency must be positive".to_string()));
        }
        Ok(CoordinatorConfig {
            mode: self.scanner.fetch_mode,
            max_concurrency: self.scanner.max_concurrency,
            per_request_timeout: positive_duration(
                "timeouts.per_request_timeout_seconds",
                self.timeouts.per_request_timeout_seconds,
            )?,
            cycle_timeout: positive_duration("timeouts.cycle_timeout_seconds", self.timeouts.cycle_timeout_seconds)?,
        })
    }

    /// Check every section without touching the pair file
    pub fn validate(&self) -> Result<(), AppError> {
        self.exchange_ids()?;
        self.detector_config()?;
        self.coordinator_config()?;
        positive_duration("monitor.poll_interval_seconds", self.monitor.poll_interval_seconds)?;
        positive_duration("monitor.cache_ttl_seconds", self.monitor.cache_ttl_seconds)?;
        if self.scanner.pairs_file.is_none() {
            dedup_pairs(self.scanner.pairs.iter().map(String::as_str))?;
        }
        Ok(())
    }

    pub fn monitor_settings(&self) -> Result<MonitorSettings, AppError> {
        self.validate()?;
        Ok(MonitorSettings {
            exchanges: self.exchange_ids()?,
            pairs: self.load_pairs()?,
            detector: self.detector_config()?,
            coordinator: self.coordinator_config()?,
            poll_interval: positive_duration("monitor.poll_interval_seconds", self.monitor.poll_interval_seconds)?,
            cache_ttl: positive_duration("monitor.cache_ttl_seconds", self.monitor.cache_ttl_seconds)?,
        })
    }
}

fn non_negative_decimal(name: &str, value: f64) -> Result<Decimal, AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::ConfigError(format!("{} must be a non-negative number, got {}", name, value)));
    }
    // Shortest round-trip text keeps 0.05 as 0.05 rather than its binary expansion
    parse_decimal(&value.to_string()).ok_or_else(|| AppError::ConfigError(format!("{} is out of range: {}", name, value)))
}

fn positive_duration(name: &str, seconds: f64) -> Result<Duration, AppError> {
    match Duration::try_from_secs_f64(seconds) {
        Ok(d) if !d.is_zero() => Ok(d),
        _ => Err(AppError::ConfigError(format!("{} must be positive, got {}", name, seconds))),
    }
}

fn dedup_pairs<'a>(symbols: impl Iterator<Item = &'a str>) -> Result<Vec<CanonicalPair>, AppError> {
    let mut seen = HashSet::new();
    let mut pairs = Vec::new();
    for symbol in symbols {
        let pair: CanonicalPair = symbol.parse()?;
        if seen.insert(pair.clone()) {
            pairs.push(pair);
        }
    }
    Ok(pairs)
}

/// Parse a pair list: one pair per line, blank and `#` lines skipped,
/// duplicates dropped keeping the first occurrence
pub fn parse_pairs_list(text: &str) -> Result<Vec<CanonicalPair>, AppError> {
    dedup_pairs(
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#')),
    )
}

/// Render pairs in the format `parse_pairs_list` reads, under a `#` header
pub fn format_pairs_list(pairs: &[CanonicalPair], header: &str) -> String {
    let mut out = String::new();
    for line in header.lines() {
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }
    for pair in pairs {
        out.push_str(&pair.symbol());
        out.push('\n');
    }
    out
}
