use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use super::{BinanceAdapter, BybitAdapter, GateIoAdapter, HtxAdapter, MexcAdapter};
use crate::domain::exchange::{ExchangeAdapter, ExchangeId, ExchangeRegistry};
use crate::shared::errors::AppError;

/// HTTP client shared by the adapters, with a fixed per-request timeout
pub fn build_http_client(per_request_timeout: Duration) -> Result<Client, AppError> {
    Client::builder()
        .timeout(per_request_timeout)
        .connect_timeout(per_request_timeout)
        .build()
        .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))
}

pub fn create_adapter(id: ExchangeId, http_client: Client) -> Arc<dyn ExchangeAdapter> {
    match id {
        ExchangeId::Binance => Arc::new(BinanceAdapter::new(http_client)),
        ExchangeId::Bybit => Arc::new(BybitAdapter::new(http_client)),
        ExchangeId::GateIo => Arc::new(GateIoAdapter::new(http_client)),
        ExchangeId::Htx => Arc::new(HtxAdapter::new(http_client)),
        ExchangeId::Mexc => Arc::new(MexcAdapter::new(http_client)),
    }
}

/// Registry with a live adapter for every supported exchange
pub fn default_registry(per_request_timeout: Duration) -> Result<ExchangeRegistry, AppError> {
    let http_client = build_http_client(per_request_timeout)?;
    let mut registry = ExchangeRegistry::new();
    for id in ExchangeId::ALL {
        registry.register(create_adapter(id, http_client.clone()));
    }
    Ok(registry)
}
