//! MEXC spot REST adapter

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use super::binance::{is_invalid_symbol, snapshot_from_24h, Ticker24h};
use super::{get_json, get_listed_json};
use crate::domain::exchange::{ExchangeAdapter, ExchangeId};
use crate::shared::errors::ExchangeError;
use crate::shared::types::{CanonicalPair, ExchangeSnapshot, Ticker};

/// MEXC spot market data client
pub struct MexcAdapter {
    http_client: Client,
    base_url: String,
}

impl MexcAdapter {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.mexc.com";

    pub fn new(http_client: Client) -> Self {
        Self::with_base_url(http_client, Self::DEFAULT_BASE_URL)
    }

    pub fn with_base_url(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    fn url(&self) -> String {
        format!("{}/api/v3/ticker/24hr", self.base_url)
    }
}

#[async_trait]
impl ExchangeAdapter for MexcAdapter {
    fn id(&self) -> ExchangeId {
        ExchangeId::Mexc
    }

    async fn fetch_all(&self) -> Result<ExchangeSnapshot, ExchangeError> {
        let tickers: Vec<Ticker24h> = get_json(&self.http_client, self.id(), &self.url(), &[]).await?;
        let snapshot = snapshot_from_24h(self.id(), &tickers);
        info!("✅ mexc returned {} pairs ({} raw)", snapshot.len(), tickers.len());
        Ok(snapshot)
    }

    async fn fetch_one(&self, pair: &CanonicalPair) -> Result<Option<Ticker>, ExchangeError> {
        let symbol = self.id().to_native(pair);
        let ticker: Option<Ticker24h> = get_listed_json(
            &self.http_client,
            self.id(),
            &self.url(),
            &[("symbol", symbol.as_str())],
            is_invalid_symbol,
        )
        .await?;
        Ok(ticker
            .and_then(|t| t.normalize(self.id()))
            .filter(|(p, _)| p == pair)
            .map(|(_, t)| t))
    }
}
