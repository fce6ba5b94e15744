//! Application layer - use cases and services

pub mod arbitrage_monitor;
pub mod commands;
pub mod fetch_coordinator;
pub mod result_cache;

#[cfg(test)]
pub(crate) mod test_support;

pub use arbitrage_monitor::{ArbitrageMonitor, MonitorSettings, PollingHandle};
pub use commands::{Cli, CommandExecutor, Commands};
pub use fetch_coordinator::{CoordinatorConfig, FetchCoordinator, FetchMode, FetchOutcome};
pub use result_cache::ResultCache;
