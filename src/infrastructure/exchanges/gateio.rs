//! Gate.io v4 spot REST adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use super::{get_json, get_listed_json};
use crate::domain::exchange::{ExchangeAdapter, ExchangeId};
use crate::shared::errors::ExchangeError;
use crate::shared::types::{CanonicalPair, ExchangeSnapshot, Ticker};
use crate::shared::utils::{field, RawDecimal};

#[derive(Debug, Deserialize)]
struct GateTicker {
    currency_pair: String,
    last: Option<RawDecimal>,
    highest_bid: Option<RawDecimal>,
    lowest_ask: Option<RawDecimal>,
    base_volume: Option<RawDecimal>,
    quote_volume: Option<RawDecimal>,
}

impl GateTicker {
    fn normalize(&self) -> Option<(CanonicalPair, Ticker)> {
        let pair = ExchangeId::GateIo.from_native(&self.currency_pair)?;
        let ticker = Ticker::checked(
            field(&self.last)?,
            field(&self.highest_bid)?,
            field(&self.lowest_ask)?,
            field(&self.base_volume)?,
            field(&self.quote_volume)?,
        )?;
        Some((pair, ticker))
    }
}

#[derive(Debug, Deserialize)]
struct GateErrorBody {
    label: String,
}

fn is_invalid_currency_pair(body: &str) -> bool {
    serde_json::from_str::<GateErrorBody>(body).map_or(false, |e| e.label == "INVALID_CURRENCY_PAIR")
}

fn snapshot_from(tickers: &[GateTicker]) -> ExchangeSnapshot {
    tickers.iter().filter_map(GateTicker::normalize).collect()
}

/// Gate.io spot market data client
pub struct GateIoAdapter {
    http_client: Client,
    base_url: String,
}

impl GateIoAdapter {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.gateio.ws";

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
        format!("{}/api/v4/spot/tickers", self.base_url)
    }
}

#[async_trait]
impl ExchangeAdapter for GateIoAdapter {
    fn id(&self) -> ExchangeId {
        ExchangeId::GateIo
    }

    async fn fetch_all(&self) -> Result<ExchangeSnapshot, ExchangeError> {
        let tickers: Vec<GateTicker> = get_json(&self.http_client, self.id(), &self.url(), &[]).await?;
        let snapshot = snapshot_from(&tickers);
        info!("✅ gateio returned {} pairs ({} raw)", snapshot.len(), tickers.len());
        Ok(snapshot)
    }

    async fn fetch_one(&self, pair: &CanonicalPair) -> Result<Option<Ticker>, ExchangeError> {
        let symbol = self.id().to_native(pair);
        let tickers: Option<Vec<GateTicker>> = get_listed_json(
            &self.http_client,
            self.id(),
            &self.url(),
            &[("currency_pair", symbol.as_str())],
            is_invalid_currency_pair,
        )
        .await?;
        Ok(tickers.and_then(|tickers| snapshot_from(&tickers).remove(pair)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::exchanges::{decode_json, stub};
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_tickers_skips_foreign_and_empty_books() {
        let body = r#"[
            {"currency_pair":"BTC_USDT","last":"50010","lowest_ask":"50020","highest_bid":"50000",
             "change_percentage":"1.2","base_volume":"80","quote_volume":"4000800","high_24h":"51000","low_24h":"49000"},
            {"currency_pair":"ETH_BTC","last":"0.05","lowest_ask":"0.0501","highest_bid":"0.0499","base_volume":"1","quote_volume":"0.05"},
            {"currency_pair":"DEAD_USDT","last":"0.1","lowest_ask":"","highest_bid":"","base_volume":"0","quote_volume":"0"}
        ]"#;
        let tickers: Vec<GateTicker> = decode_json(ExchangeId::GateIo, body).unwrap();
        let snapshot = snapshot_from(&tickers);

        assert_eq!(snapshot.len(), 1);
        let btc = &snapshot[&"BTCUSDT".parse::<CanonicalPair>().unwrap()];
        assert_eq!(btc.bid, dec!(50000));
        assert_eq!(btc.ask, dec!(50020));
        assert_eq!(btc.quote_volume, dec!(4000800));
    }

    #[test]
    fn test_error_object_is_malformed() {
        let body = r#"{"label":"INVALID_CURRENCY_PAIR","message":"Invalid currency pair"}"#;
        let err = decode_json::<Vec<GateTicker>>(ExchangeId::GateIo, body).unwrap_err();
        assert!(matches!(err, ExchangeError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_fetch_one_unlisted_pair_is_absent() {
        let base_url = stub::serve(400, r#"{"label":"INVALID_CURRENCY_PAIR","message":"Invalid currency pair NOTLISTED_USDT"}"#).await;
        let adapter = GateIoAdapter::with_base_url(stub::client(), base_url);

        assert_eq!(adapter.fetch_one(&"NOTLISTEDUSDT".parse().unwrap()).await, Ok(None));
    }

    #[tokio::test]
    async fn test_fetch_one_rate_limit_is_an_error() {
        let base_url = stub::serve(429, r#"{"label":"TOO_MANY_REQUESTS","message":"Request rate limit exceeded"}"#).await;
        let adapter = GateIoAdapter::with_base_url(stub::client(), base_url);

        let err = adapter.fetch_one(&"BTCUSDT".parse().unwrap()).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Status { status: 429, .. }));
    }
}
