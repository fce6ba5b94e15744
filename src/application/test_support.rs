//! In-process exchange adapters for coordinator and monitor tests

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::exchange::{ExchangeAdapter, ExchangeId};
use crate::shared::errors::ExchangeError;
use crate::shared::types::{CanonicalPair, ExchangeSnapshot, Ticker};

pub fn pair(symbol: &str) -> CanonicalPair {
    symbol.parse().unwrap()
}

/// Liquid ticker quoted one tick either side of `price`
pub fn ticker(price: Decimal) -> Ticker {
    Ticker::checked(price, price - dec!(0.01), price + dec!(0.01), dec!(100), dec!(5000000)).unwrap()
}

pub fn snapshot(prices: &[(&str, Decimal)]) -> ExchangeSnapshot {
    prices.iter().map(|(symbol, price)| (pair(symbol), ticker(*price))).collect()
}

pub fn as_adapters(mocks: &[Arc<MockAdapter>]) -> Vec<Arc<dyn ExchangeAdapter>> {
    mocks
        .iter()
        .map(|mock| Arc::clone(mock) as Arc<dyn ExchangeAdapter>)
        .collect()
}

pub struct MockAdapter {
    id: ExchangeId,
    snapshot: Option<ExchangeSnapshot>,
    delay: Duration,
    panics: bool,
    fetch_all_calls: AtomicUsize,
    fetch_one_calls: AtomicUsize,
}

impl MockAdapter {
    pub fn serving(id: ExchangeId, snapshot: ExchangeSnapshot) -> Arc<Self> {
        Self::slow(id, snapshot, Duration::ZERO)
    }

    pub fn slow(id: ExchangeId, snapshot: ExchangeSnapshot, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            id,
            snapshot: Some(snapshot),
            delay,
            panics: false,
            fetch_all_calls: AtomicUsize::new(0),
            fetch_one_calls: AtomicUsize::new(0),
        })
    }

    /// Answers every call with HTTP 503
    pub fn failing(id: ExchangeId) -> Arc<Self> {
        Arc::new(Self {
            id,
            snapshot: None,
            delay: Duration::ZERO,
            panics: false,
            fetch_all_calls: AtomicUsize::new(0),
            fetch_one_calls: AtomicUsize::new(0),
        })
    }

    /// Panics inside every call
    pub fn panicking(id: ExchangeId) -> Arc<Self> {
        Arc::new(Self {
            id,
            snapshot: None,
            delay: Duration::ZERO,
            panics: true,
            fetch_all_calls: AtomicUsize::new(0),
            fetch_one_calls: AtomicUsize::new(0),
        })
    }

    pub fn fetch_all_calls(&self) -> usize {
        self.fetch_all_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_one_calls(&self) -> usize {
        self.fetch_one_calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> Result<&ExchangeSnapshot, ExchangeError> {
        if self.panics {
            panic!("{} adapter blew up", self.id);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.snapshot.as_ref().ok_or_else(|| ExchangeError::Status {
            exchange: self.id.to_string(),
            status: 503,
        })
    }
}

#[async_trait]
impl ExchangeAdapter for MockAdapter {
    fn id(&self) -> ExchangeId {
        self.id
    }

    async fn fetch_all(&self) -> Result<ExchangeSnapshot, ExchangeError> {
        self.fetch_all_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await.cloned()
    }

    async fn fetch_one(&self, pair: &CanonicalPair) -> Result<Option<Ticker>, ExchangeError> {
        self.fetch_one_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.respond().await?.get(pair).copied())
    }
}
