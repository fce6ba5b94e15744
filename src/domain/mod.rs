//! Domain layer - core business logic and entities

pub mod arbitrage;
pub mod exchange;
pub mod market;
