//! HTX (Huobi) spot REST adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::get_json;
use crate::domain::exchange::{ExchangeAdapter, ExchangeId};
use crate::shared::errors::ExchangeError;
use crate::shared::types::{CanonicalPair, ExchangeSnapshot, Ticker};
use crate::shared::utils::{field, RawDecimal};

/// Envelope shared by HTX market endpoints
#[derive(Debug, Deserialize)]
struct HtxResponse<T> {
    status: String,
    #[serde(rename = "err-code")]
    err_code: Option<String>,
    #[serde(rename = "err-msg")]
    err_msg: Option<String>,
    data: Option<T>,
    tick: Option<T>,
}

impl<T> HtxResponse<T> {
    /// `invalid-parameter` with an "invalid symbol" message
    fn is_invalid_symbol(&self) -> bool {
        self.status != "ok"
            && self.err_code.as_deref() == Some("invalid-parameter")
            && self
                .err_msg
                .as_deref()
                .map_or(false, |msg| msg.to_ascii_lowercase().contains("invalid symbol"))
    }

    fn into_payload(self) -> Result<T, ExchangeError> {
        if self.status != "ok" {
            return Err(ExchangeError::Api {
                exchange: ExchangeId::Htx.to_string(),
                message: self.err_msg.unwrap_or(self.status),
            });
        }
        self.data.or(self.tick).ok_or_else(|| ExchangeError::Malformed {
            exchange: ExchangeId::Htx.to_string(),
            message: "missing data".to_string(),
        })
    }
}

/// Entry of `/market/tickers`
#[derive(Debug, Deserialize)]
struct HtxTicker {
    symbol: String,
    close: Option<RawDecimal>,
    bid: Option<RawDecimal>,
    ask: Option<RawDecimal>,
    /// Base-denominated 24h volume
    amount: Option<RawDecimal>,
    /// Quote-denominated 24h volume
    vol: Option<RawDecimal>,
}

impl HtxTicker {
    fn normalize(&self) -> Option<(CanonicalPair, Ticker)> {
        let pair = ExchangeId::Htx.from_native(&self.symbol)?;
        let ticker = Ticker::checked(
            field(&self.close)?,
            field(&self.bid)?,
            field(&self.ask)?,
            field(&self.amount)?,
            field(&self.vol)?,
        )?;
        Some((pair, ticker))
    }
}

/// `tick` of `/market/detail/merged`; bid/ask are `[price, size]`
#[derive(Debug, Deserialize)]
struct HtxMergedTick {
    close: Option<RawDecimal>,
    #[serde(default)]
    bid: Vec<RawDecimal>,
    #[serde(default)]
    ask: Vec<RawDecimal>,
    amount: Option<RawDecimal>,
    vol: Option<RawDecimal>,
}

impl HtxMergedTick {
    fn normalize(&self) -> Option<Ticker> {
        Ticker::checked(
            field(&self.close)?,
            self.bid.first()?.to_decimal()?,
            self.ask.first()?.to_decimal()?,
            field(&self.amount)?,
            field(&self.vol)?,
        )
    }
}

fn snapshot_from(tickers: &[HtxTicker]) -> ExchangeSnapshot {
    tickers.iter().filter_map(HtxTicker::normalize).collect()
}

/// HTX spot market data client
pub struct HtxAdapter {
    http_client: Client,
    base_url: String,
}

impl HtxAdapter {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.huobi.pro";

    pub fn new(http_client: Client) -> Self {
        Self::with_base_url(http_client, Self::DEFAULT_BASE_URL)
    }

    pub fn with_base_url(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ExchangeAdapter for HtxAdapter {
    fn id(&self) -> ExchangeId {
        ExchangeId::Htx
    }

    async fn fetch_all(&self) -> Result<ExchangeSnapshot, ExchangeError> {
        let url = format!("{}/market/tickers", self.base_url);
        let response: HtxResponse<Vec<HtxTicker>> = get_json(&self.http_client, self.id(), &url, &[]).await?;
        let tickers = response.into_payload()?;
        let snapshot = snapshot_from(&tickers);
        info!("✅ htx returned {} pairs ({} raw)", snapshot.len(), tickers.len());
        Ok(snapshot)
    }

    async fn fetch_one(&self, pair: &CanonicalPair) -> Result<Option<Ticker>, ExchangeError> {
        let url = format!("{}/market/detail/merged", self.base_url);
        let symbol = self.id().to_native(pair);
        let response: HtxResponse<HtxMergedTick> =
            get_json(&self.http_client, self.id(), &url, &[("symbol", symbol.as_str())]).await?;
        if response.is_invalid_symbol() {
            debug!("htx: {} not listed", symbol);
            return Ok(None);
        }
        Ok(response.into_payload()?.normalize())
    }
}
