//! Infrastructure layer - network clients for external market data

pub mod exchanges;

pub use exchanges::default_registry;
