//! Exchange adapter trait

use async_trait::async_trait;

use super::ExchangeId;
use crate::shared::errors::ExchangeError;
use crate::shared::types::{CanonicalPair, ExchangeSnapshot, Ticker};

/// Common interface for all exchange implementations.
///
/// Snapshots are keyed by canonical pairs: adapters normalize native symbols
/// before returning, so callers never see exchange-specific spellings.
/// Failures are returned as typed errors; the fetch coordinator turns them
/// into "no data from this exchange this cycle".
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    fn id(&self) -> ExchangeId;

    /// Every supported ticker the exchange lists
    async fn fetch_all(&self) -> Result<ExchangeSnapshot, ExchangeError>;

    /// Ticker for a single pair; `Ok(None)` when the exchange does not list it
    async fn fetch_one(&self, pair: &CanonicalPair) -> Result<Option<Ticker>, ExchangeError>;
}
