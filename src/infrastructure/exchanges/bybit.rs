//! Bybit v5 spot REST adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::get_json;
use crate::domain::exchange::{ExchangeAdapter, ExchangeId};
use crate::shared::errors::ExchangeError;
use crate::shared::types::{CanonicalPair, ExchangeSnapshot, Ticker};
use crate::shared::utils::{field, RawDecimal};

/// retCode for a symbol the exchange does not list
const NOT_SUPPORTED_SYMBOLS: i64 = 10001;

#[derive(Debug, Deserialize)]
struct BybitResponse {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg", default)]
    ret_msg: String,
    result: Option<BybitResult>,
}

#[derive(Debug, Deserialize)]
struct BybitResult {
    #[serde(default)]
    list: Vec<BybitTicker>,
}

#[derive(Debug, Deserialize)]
struct BybitTicker {
    symbol: String,
    #[serde(rename = "lastPrice")]
    last_price: Option<RawDecimal>,
    #[serde(rename = "bid1Price")]
    bid1_price: Option<RawDecimal>,
    #[serde(rename = "ask1Price")]
    ask1_price: Option<RawDecimal>,
    #[serde(rename = "volume24h")]
    volume_24h: Option<RawDecimal>,
    /// Quote-denominated 24h volume
    #[serde(rename = "turnover24h")]
    turnover_24h: Option<RawDecimal>,
}

impl BybitTicker {
    fn normalize(&self) -> Option<(CanonicalPair, Ticker)> {
        let pair = ExchangeId::Bybit.from_native(&self.symbol)?;
        let ticker = Ticker::checked(
            field(&self.last_price)?,
            field(&self.bid1_price)?,
            field(&self.ask1_price)?,
            field(&self.volume_24h)?,
            field(&self.turnover_24h)?,
        )?;
        Some((pair, ticker))
    }
}

impl BybitResponse {
    fn into_tickers(self) -> Result<Vec<BybitTicker>, ExchangeError> {
        if self.ret_code != 0 {
            return Err(ExchangeError::Api {
                exchange: ExchangeId::Bybit.to_string(),
                message: format!("retCode {}: {}", self.ret_code, self.ret_msg),
            });
        }
        self.result
            .map(|r| r.list)
            .ok_or_else(|| ExchangeError::Malformed {
                exchange: ExchangeId::Bybit.to_string(),
                message: "missing result".to_string(),
            })
    }
}

fn snapshot_from(tickers: &[BybitTicker]) -> ExchangeSnapshot {
    tickers.iter().filter_map(BybitTicker::normalize).collect()
}

/// Bybit spot market data client
pub struct BybitAdapter {
    http_client: Client,
    base_url: String,
}

impl BybitAdapter {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.bybit.com";

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
        format!("{}/v5/market/tickers", self.base_url)
    }
}

#[async_trait]
impl ExchangeAdapter for BybitAdapter {
    fn id(&self) -> ExchangeId {
        ExchangeId::Bybit
    }

    async fn fetch_all(&self) -> Result<ExchangeSnapshot, ExchangeError> {
        let response: BybitResponse =
            get_json(&self.http_client, self.id(), &self.url(), &[("category", "spot")]).await?;
        let tickers = response.into_tickers()?;
        let snapshot = snapshot_from(&tickers);
        info!("✅ bybit returned {} pairs ({} raw)", snapshot.len(), tickers.len());
        Ok(snapshot)
    }

    async fn fetch_one(&self, pair: &CanonicalPair) -> Result<Option<Ticker>, ExchangeError> {
        let symbol = self.id().to_native(pair);
        let response: BybitResponse = get_json(
            &self.http_client,
            self.id(),
            &self.url(),
            &[("category", "spot"), ("symbol", symbol.as_str())],
        )
        .await?;
        if response.ret_code == NOT_SUPPORTED_SYMBOLS {
            debug!("bybit: {} not listed", symbol);
            return Ok(None);
        }
        let tickers = response.into_tickers()?;
        Ok(snapshot_from(&tickers).remove(pair))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::exchanges::{decode_json, stub};
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_volume_comes_from_turnover() {
        let body = r#"{"retCode":0,"retMsg":"OK","result":{"category":"spot","list":[
            {"symbol":"BTCUSDT","bid1Price":"50080","bid1Size":"0.1","ask1Price":"50100","ask1Size":"0.2",
             "lastPrice":"50090","prevPrice24h":"49000","volume24h":"60","turnover24h":"3000000"},
            {"symbol":"BTCEUR","bid1Price":"46000","ask1Price":"46010","lastPrice":"46005","volume24h":"1","turnover24h":"46005"}
        ]},"time":1700000000000}"#;
        let response: BybitResponse = decode_json(ExchangeId::Bybit, body).unwrap();
        let snapshot = snapshot_from(&response.into_tickers().unwrap());

        assert_eq!(snapshot.len(), 1);
        let btc = &snapshot[&"BTCUSDT".parse::<CanonicalPair>().unwrap()];
        assert_eq!(btc.bid, dec!(50080));
        assert_eq!(btc.ask, dec!(50100));
        assert_eq!(btc.base_volume, dec!(60));
        assert_eq!(btc.quote_volume, dec!(3000000));
    }

    #[test]
    fn test_nonzero_ret_code_is_api_error() {
        let body = r#"{"retCode":10001,"retMsg":"Not supported symbols","result":{},"time":1}"#;
        let response: BybitResponse = decode_json(ExchangeId::Bybit, body).unwrap();
        assert!(matches!(response.into_tickers(), Err(ExchangeError::Api { .. })));
    }

    #[tokio::test]
    async fn test_fetch_one_unlisted_symbol_is_absent() {
        let base_url = stub::serve(200, r#"{"retCode":10001,"retMsg":"Not supported symbols","result":{},"time":1}"#).await;
        let adapter = BybitAdapter::with_base_url(stub::client(), base_url);

        assert_eq!(adapter.fetch_one(&"NOTLISTEDUSDT".parse().unwrap()).await, Ok(None));
    }

    #[tokio::test]
    async fn test_fetch_one_other_ret_code_is_an_error() {
        let base_url = stub::serve(200, r#"{"retCode":10006,"retMsg":"Too many visits!","result":{},"time":1}"#).await;
        let adapter = BybitAdapter::with_base_url(stub::client(), base_url);

        let err = adapter.fetch_one(&"BTCUSDT".parse().unwrap()).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Api { .. }));
    }
}
