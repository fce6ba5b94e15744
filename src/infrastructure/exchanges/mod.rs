//! REST adapters for centralized exchanges

pub mod binance;
pub mod bybit;
pub mod factory;
pub mod gateio;
pub mod htx;
pub mod mexc;

pub use binance::BinanceAdapter;
pub use bybit::BybitAdapter;
pub use factory::{build_http_client, create_adapter, default_registry};
pub use gateio::GateIoAdapter;
pub use htx::HtxAdapter;
pub use mexc::MexcAdapter;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::exchange::ExchangeId;
use crate::shared::errors::ExchangeError;

/// GET `url` and decode the JSON body.
///
/// Transport failures, timeouts, non-2xx statuses and undecodable bodies all
/// come back as typed `ExchangeError`s.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    exchange: ExchangeId,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T, ExchangeError> {
    let (status, body) = get_body(client, exchange, url, query).await?;
    if !status.is_success() {
        return Err(status_error(exchange, status));
    }
    decode_json(exchange, &body)
}

/// GET a single-pair endpoint.
///
/// An error response that `unlisted` recognizes as the exchange's "unknown
/// symbol" answer yields `Ok(None)`; every other error status is an `Err`.
pub(crate) async fn get_listed_json<T: DeserializeOwned>(
    client: &Client,
    exchange: ExchangeId,
    url: &str,
    query: &[(&str, &str)],
    unlisted: fn(&str) -> bool,
) -> Result<Option<T>, ExchangeError> {
    let (status, body) = get_body(client, exchange, url, query).await?;
    if !status.is_success() {
        if unlisted(&body) {
            debug!("{}: {:?} not listed", exchange, query);
            return Ok(None);
        }
        return Err(status_error(exchange, status));
    }
    decode_json(exchange, &body).map(Some)
}

async fn get_body(
    client: &Client,
    exchange: ExchangeId,
    url: &str,
    query: &[(&str, &str)],
) -> Result<(StatusCode, String), ExchangeError> {
    debug!("{}: GET {} {:?}", exchange, url, query);

    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| transport_error(exchange, e))?;

    let status = response.status();
    let body = response.text().await.map_err(|e| transport_error(exchange, e))?;
    Ok((status, body))
}

fn status_error(exchange: ExchangeId, status: StatusCode) -> ExchangeError {
    ExchangeError::Status {
        exchange: exchange.to_string(),
        status: status.as_u16(),
    }
}

/// Decode a response body, quoting its head on failure
pub(crate) fn decode_json<T: DeserializeOwned>(exchange: ExchangeId, body: &str) -> Result<T, ExchangeError> {
    serde_json::from_str(body).map_err(|e| ExchangeError::Malformed {
        exchange: exchange.to_string(),
        message: format!(
            "{}. First 100 chars: {}",
            e,
            body.chars().take(100).collect::<String>()
        ),
    })
}

fn transport_error(exchange: ExchangeId, e: reqwest::Error) -> ExchangeError {
    if e.is_timeout() {
        ExchangeError::Timeout {
            exchange: exchange.to_string(),
        }
    } else {
        ExchangeError::Transport {
            exchange: exchange.to_string(),
            message: e.to_string(),
        }
    }
}
