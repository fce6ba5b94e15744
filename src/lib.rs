//! Arbmon - cross-exchange spot arbitrage monitor
//! Built with Domain-Driven Design principles

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod report;
pub mod shared;

// Re-export main types for convenience
pub use application::{ArbitrageMonitor, FetchCoordinator, ResultCache};
pub use config::Config;
pub use domain::arbitrage::Opportunity;
pub use domain::exchange::{ExchangeAdapter, ExchangeId, ExchangeRegistry};
pub use report::CycleReport;
