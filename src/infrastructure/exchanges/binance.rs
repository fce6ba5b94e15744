//! Binance spot REST adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use super::{get_json, get_listed_json};
use crate::domain::exchange::{ExchangeAdapter, ExchangeId};
use crate::shared::errors::ExchangeError;
use crate::shared::types::{CanonicalPair, ExchangeSnapshot, Ticker};
use crate::shared::utils::{field, RawDecimal};

/// Entry of the `/api/v3/ticker/24hr` response.
///
/// MEXC serves the same shape on the same path.
#[derive(Debug, Deserialize)]
pub(super) struct Ticker24h {
    symbol: String,
    #[serde(rename = "lastPrice")]
    last_price: Option<RawDecimal>,
    #[serde(rename = "bidPrice")]
    bid_price: Option<RawDecimal>,
    #[serde(rename = "askPrice")]
    ask_price: Option<RawDecimal>,
    volume: Option<RawDecimal>,
    #[serde(rename = "quoteVolume")]
    quote_volume: Option<RawDecimal>,
}

impl Ticker24h {
    pub(super) fn normalize(&self, exchange: ExchangeId) -> Option<(CanonicalPair, Ticker)> {
        let pair = exchange.from_native(&self.symbol)?;
        let ticker = Ticker::checked(
            field(&self.last_price)?,
            field(&self.bid_price)?,
            field(&self.ask_price)?,
            field(&self.volume)?,
            field(&self.quote_volume)?,
        )?;
        Some((pair, ticker))
    }
}

/// Error body of the `/api/v3` family
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
}

/// Error code for a symbol the exchange does not list
const INVALID_SYMBOL: i64 = -1121;

/// Binance and MEXC both answer an unknown symbol with code -1121
pub(super) fn is_invalid_symbol(body: &str) -> bool {
    serde_json::from_str::<ApiErrorBody>(body).map_or(false, |e| e.code == INVALID_SYMBOL)
}

pub(super) fn snapshot_from_24h(exchange: ExchangeId, tickers: &[Ticker24h]) -> ExchangeSnapshot {
    tickers.iter().filter_map(|t| t.normalize(exchange)).collect()
}

/// Binance spot market data client
pub struct BinanceAdapter {
    http_client: Client,
    base_url: String,
}

impl BinanceAdapter {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.binance.com";

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
impl ExchangeAdapter for BinanceAdapter {
    fn id(&self) -> ExchangeId {
        ExchangeId::Binance
    }

    async fn fetch_all(&self) -> Result<ExchangeSnapshot, ExchangeError> {
        let tickers: Vec<Ticker24h> = get_json(&self.http_client, self.id(), &self.url(), &[]).await?;
        let snapshot = snapshot_from_24h(self.id(), &tickers);
        info!("✅ binance returned {} pairs ({} raw)", snapshot.len(), tickers.len());
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
