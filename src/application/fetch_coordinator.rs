//! Parallel fetch coordinator
//!
//! Fans out one task per exchange (or per exchange and pair), bounds how many
//! run at once, puts each call under its own timeout and collects whatever
//! completed before the cycle deadline. A slow or failing exchange only costs
//! its own entry.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::domain::exchange::{ExchangeAdapter, ExchangeId};
use crate::domain::market::CycleSnapshots;
use crate::shared::errors::ExchangeError;
use crate::shared::types::{CanonicalPair, ExchangeSnapshot};

/// Lower bound on concurrent tasks in per-pair mode
const PER_PAIR_MIN_CONCURRENCY: usize = 10;

/// Fetch granularity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// One bulk ticker call per exchange, filtered to the requested pairs
    #[default]
    AllTickers,
    /// One single-ticker call per exchange and pair
    PerPair,
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub mode: FetchMode,
    pub max_concurrency: usize,
    pub per_request_timeout: Duration,
    pub cycle_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::AllTickers,
            max_concurrency: 5,
            per_request_timeout: Duration::from_secs(10),
            cycle_timeout: Duration::from_secs(15),
        }
    }
}

/// What one exchange produced this cycle
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Completed(ExchangeSnapshot),
    Failed(ExchangeError),
    TimedOut,
    /// The fetch task panicked before producing a result
    Panicked,
}

impl FetchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, FetchOutcome::Completed(_))
    }

    pub fn into_snapshot(self) -> Option<ExchangeSnapshot> {
        match self {
            FetchOutcome::Completed(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// Combine two calls to the same exchange. Any completed call makes the
    /// exchange completed; otherwise the first failure is kept.
    fn merge(self, other: FetchOutcome) -> FetchOutcome {
        match (self, other) {
            (FetchOutcome::Completed(mut a), FetchOutcome::Completed(b)) => {
                a.extend(b);
                FetchOutcome::Completed(a)
            }
            (completed @ FetchOutcome::Completed(_), _) => completed,
            (_, completed @ FetchOutcome::Completed(_)) => completed,
            (first, _) => first,
        }
    }
}

/// Run one adapter call under the per-request timeout
async fn guarded<F>(exchange: ExchangeId, limit: Duration, call: F) -> FetchOutcome
where
    F: Future<Output = Result<ExchangeSnapshot, ExchangeError>>,
{
    match timeout(limit, call).await {
        Ok(Ok(snapshot)) => FetchOutcome::Completed(snapshot),
        Ok(Err(e)) if e.is_timeout() => {
            warn!("⏱️ {}", e);
            FetchOutcome::TimedOut
        }
        Ok(Err(e)) => {
            warn!("❌ {}", e);
            FetchOutcome::Failed(e)
        }
        Err(_) => {
            warn!("⏱️ {}: no response within {:?}", exchange, limit);
            FetchOutcome::TimedOut
        }
    }
}

pub struct FetchCoordinator {
    config: CoordinatorConfig,
}

impl FetchCoordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Snapshots from every exchange that completed in time; the rest are omitted
    pub async fn gather(&self, adapters: &[Arc<dyn ExchangeAdapter>], pairs: &[CanonicalPair]) -> CycleSnapshots {
        self.gather_with_outcomes(adapters, pairs)
            .await
            .into_iter()
            .filter_map(|(exchange, outcome)| outcome.into_snapshot().map(|s| (exchange, s)))
            .collect()
    }

    /// Typed outcome for every requested exchange.
    ///
    /// An empty `pairs` slice in bulk mode keeps every ticker the exchange lists.
    pub async fn gather_with_outcomes(
        &self,
        adapters: &[Arc<dyn ExchangeAdapter>],
        pairs: &[CanonicalPair],
    ) -> BTreeMap<ExchangeId, FetchOutcome> {
        let started = Instant::now();
        let deadline = started + self.config.cycle_timeout;

        let mut tasks = FetchTasks::default();
        match self.config.mode {
            FetchMode::AllTickers => self.spawn_bulk(&mut tasks, adapters, pairs),
            FetchMode::PerPair => self.spawn_per_pair(&mut tasks, adapters, pairs),
        }
        let FetchTasks { set: mut tasks, owners } = tasks;

        let mut outcomes: BTreeMap<ExchangeId, FetchOutcome> = BTreeMap::new();
        let mut record = |exchange: ExchangeId, outcome: FetchOutcome| {
            let merged = match outcomes.remove(&exchange) {
                Some(previous) => previous.merge(outcome),
                None => outcome,
            };
            outcomes.insert(exchange, merged);
        };
        loop {
            match timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((exchange, outcome)))) => record(exchange, outcome),
                Ok(Some(Err(e))) => match owners.get(&e.id()) {
                    Some(exchange) if e.is_panic() => {
                        warn!("💥 {}: fetch task panicked", exchange);
                        record(*exchange, FetchOutcome::Panicked);
                    }
                    _ => warn!("⚠️ Fetch task aborted: {}", e),
                },
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        "⏱️ Cycle deadline of {:?} reached, abandoning {} pending fetches",
                        self.config.cycle_timeout,
                        tasks.len()
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        for adapter in adapters {
            outcomes.entry(adapter.id()).or_insert(FetchOutcome::TimedOut);
        }

        let responded = outcomes.values().filter(|o| o.is_completed()).count();
        info!(
            "📡 {}/{} exchanges responded in {}ms",
            responded,
            outcomes.len(),
            started.elapsed().as_millis()
        );
        outcomes
    }

    fn spawn_bulk(
        &self,
        tasks: &mut FetchTasks,
        adapters: &[Arc<dyn ExchangeAdapter>],
        pairs: &[CanonicalPair],
    ) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let wanted: Arc<HashSet<CanonicalPair>> = Arc::new(pairs.iter().cloned().collect());
        let limit = self.config.per_request_timeout;

        for adapter in adapters {
            let exchange = adapter.id();
            let adapter = Arc::clone(adapter);
            let semaphore = Arc::clone(&semaphore);
            let wanted = Arc::clone(&wanted);
            tasks.spawn(exchange, async move {
                let _permit = semaphore.acquire_owned().await;
                let outcome = match guarded(exchange, limit, adapter.fetch_all()).await {
                    FetchOutcome::Completed(mut snapshot) if !wanted.is_empty() => {
                        snapshot.retain(|pair, _| wanted.contains(pair));
                        FetchOutcome::Completed(snapshot)
                    }
                    other => other,
                };
                if let FetchOutcome::Completed(snapshot) = &outcome {
                    debug!("{}: {} requested pairs quoted", exchange, snapshot.len());
                }
                (exchange, outcome)
            });
        }
    }

    fn spawn_per_pair(
        &self,
        tasks: &mut FetchTasks,
        adapters: &[Arc<dyn ExchangeAdapter>],
        pairs: &[CanonicalPair],
    ) {
        let permits = self.config.max_concurrency.max(PER_PAIR_MIN_CONCURRENCY);
        let semaphore = Arc::new(Semaphore::new(permits));
        let limit = self.config.per_request_timeout;

        for adapter in adapters {
            let exchange = adapter.id();
            if pairs.is_empty() {
                // Nothing to ask for; the exchange still counts as having answered
                tasks.spawn(exchange, async move { (exchange, FetchOutcome::Completed(ExchangeSnapshot::new())) });
                continue;
            }
            for pair in pairs {
                let adapter = Arc::clone(adapter);
                let semaphore = Arc::clone(&semaphore);
                let pair = pair.clone();
                tasks.spawn(exchange, async move {
                    let _permit = semaphore.acquire_owned().await;
                    let call = async {
                        let ticker = adapter.fetch_one(&pair).await?;
                        Ok::<ExchangeSnapshot, ExchangeError>(ticker.map(|t| (pair.clone(), t)).into_iter().collect())
                    };
                    (exchange, guarded(exchange, limit, call).await)
                });
            }
        }
    }
}

/// Spawned fetches, with the exchange each task belongs to
#[derive(Default)]
struct FetchTasks {
    set: JoinSet<(ExchangeId, FetchOutcome)>,
    owners: HashMap<Id, ExchangeId>,
}

impl FetchTasks {
    fn spawn<F>(&mut self, exchange: ExchangeId, task: F)
    where
        F: Future<Output = (ExchangeId, FetchOutcome)> + Send + 'static,
    {
        let handle = self.set.spawn(task);
        self.owners.insert(handle.id(), exchange);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{as_adapters, pair, snapshot, MockAdapter};
    use rust_decimal_macros::dec;

    fn config(mode: FetchMode) -> CoordinatorConfig {
        CoordinatorConfig {
            mode,
            max_concurrency: 5,
            per_request_timeout: Duration::from_millis(300),
            cycle_timeout: Duration::from_secs(2),
        }
    }

    #[tokio::test]
    async fn test_gather_filters_to_requested_pairs() {
        let adapters = as_adapters(&[
            MockAdapter::serving(ExchangeId::Binance, snapshot(&[("BTCUSDT", dec!(100)), ("ETHUSDT", dec!(10))])),
            MockAdapter::serving(ExchangeId::Bybit, snapshot(&[("BTCUSDT", dec!(101))])),
        ]);
        let coordinator = FetchCoordinator::new(config(FetchMode::AllTickers));

        let snapshots = coordinator.gather(&adapters, &[pair("BTCUSDT")]).await;

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[&ExchangeId::Binance].len(), 1);
        assert!(snapshots[&ExchangeId::Binance].contains_key(&pair("BTCUSDT")));
    }

    #[tokio::test]
    async fn test_empty_pair_list_keeps_everything_in_bulk_mode() {
        let adapters = as_adapters(&[MockAdapter::serving(
            ExchangeId::Mexc,
            snapshot(&[("BTCUSDT", dec!(100)), ("ETHUSDT", dec!(10))]),
        )]);
        let coordinator = FetchCoordinator::new(config(FetchMode::AllTickers));

        let snapshots = coordinator.gather(&adapters, &[]).await;
        assert_eq!(snapshots[&ExchangeId::Mexc].len(), 2);
    }

    #[tokio::test]
    async fn test_failures_and_timeouts_are_contained() {
        let adapters = as_adapters(&[
            MockAdapter::serving(ExchangeId::Binance, snapshot(&[("BTCUSDT", dec!(100))])),
            MockAdapter::failing(ExchangeId::Bybit),
            MockAdapter::slow(ExchangeId::Htx, snapshot(&[("BTCUSDT", dec!(100))]), Duration::from_secs(5)),
        ]);
        let coordinator = FetchCoordinator::new(config(FetchMode::AllTickers));

        let outcomes = coordinator.gather_with_outcomes(&adapters, &[pair("BTCUSDT")]).await;

        assert!(outcomes[&ExchangeId::Binance].is_completed());
        assert!(matches!(outcomes[&ExchangeId::Bybit], FetchOutcome::Failed(ExchangeError::Status { status: 503, .. })));
        assert_eq!(outcomes[&ExchangeId::Htx], FetchOutcome::TimedOut);

        let snapshots = coordinator.gather(&adapters, &[pair("BTCUSDT")]).await;
        assert_eq!(snapshots.keys().copied().collect::<Vec<_>>(), vec![ExchangeId::Binance]);
    }

    #[tokio::test]
    async fn test_cycle_deadline_abandons_slow_exchanges() {
        let adapters = as_adapters(&[
            MockAdapter::serving(ExchangeId::Binance, snapshot(&[("BTCUSDT", dec!(100))])),
            MockAdapter::slow(ExchangeId::Mexc, snapshot(&[("BTCUSDT", dec!(100))]), Duration::from_secs(10)),
        ]);
        let coordinator = FetchCoordinator::new(CoordinatorConfig {
            per_request_timeout: Duration::from_secs(30),
            cycle_timeout: Duration::from_millis(300),
            ..config(FetchMode::AllTickers)
        });

        let started = std::time::Instant::now();
        let outcomes = coordinator.gather_with_outcomes(&adapters, &[pair("BTCUSDT")]).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(outcomes[&ExchangeId::Binance].is_completed());
        assert_eq!(outcomes[&ExchangeId::Mexc], FetchOutcome::TimedOut);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let mocks: Vec<_> = ExchangeId::ALL
            .iter()
            .map(|id| MockAdapter::slow(*id, snapshot(&[("BTCUSDT", dec!(100))]), Duration::from_millis(200)))
            .collect();
        let adapters = as_adapters(&mocks);
        let coordinator = FetchCoordinator::new(CoordinatorConfig {
            max_concurrency: 1,
            per_request_timeout: Duration::from_secs(2),
            cycle_timeout: Duration::from_secs(5),
            ..config(FetchMode::AllTickers)
        });

        let started = std::time::Instant::now();
        let snapshots = coordinator.gather(&adapters, &[pair("BTCUSDT")]).await;

        assert_eq!(snapshots.len(), 5);
        assert!(started.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test]
    async fn test_per_pair_mode_keeps_partial_results() {
        let binance = MockAdapter::serving(
            ExchangeId::Binance,
            snapshot(&[("BTCUSDT", dec!(100)), ("ETHUSDT", dec!(10))]),
        );
        let adapters = as_adapters(&[
            binance.clone(),
            MockAdapter::serving(ExchangeId::GateIo, snapshot(&[("ETHUSDT", dec!(10))])),
            MockAdapter::failing(ExchangeId::Htx),
        ]);
        let coordinator = FetchCoordinator::new(config(FetchMode::PerPair));
        let pairs = [pair("BTCUSDT"), pair("ETHUSDT"), pair("SOLUSDT")];

        let outcomes = coordinator.gather_with_outcomes(&adapters, &pairs).await;

        assert_eq!(binance.fetch_one_calls(), 3);
        assert_eq!(binance.fetch_all_calls(), 0);
        match &outcomes[&ExchangeId::Binance] {
            FetchOutcome::Completed(snapshot) => assert_eq!(snapshot.len(), 2),
            other => panic!("unexpected outcome: {other:?}"),
        }
        match &outcomes[&ExchangeId::GateIo] {
            FetchOutcome::Completed(snapshot) => {
                assert_eq!(snapshot.keys().cloned().collect::<Vec<_>>(), vec![pair("ETHUSDT")])
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(matches!(outcomes[&ExchangeId::Htx], FetchOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_panicking_adapter_is_reported_as_panicked() {
        let adapters = as_adapters(&[
            MockAdapter::serving(ExchangeId::Binance, snapshot(&[("BTCUSDT", dec!(100))])),
            MockAdapter::panicking(ExchangeId::GateIo),
        ]);

        for mode in [FetchMode::AllTickers, FetchMode::PerPair] {
            let coordinator = FetchCoordinator::new(config(mode));
            let outcomes = coordinator.gather_with_outcomes(&adapters, &[pair("BTCUSDT")]).await;

            assert!(outcomes[&ExchangeId::Binance].is_completed());
            assert_eq!(outcomes[&ExchangeId::GateIo], FetchOutcome::Panicked);
        }
    }

    #[tokio::test]
    async fn test_exchange_listing_no_requested_pair_still_responds() {
        let adapters = as_adapters(&[MockAdapter::serving(ExchangeId::Htx, snapshot(&[("BTCUSDT", dec!(100))]))]);
        let coordinator = FetchCoordinator::new(config(FetchMode::PerPair));

        let outcomes = coordinator
            .gather_with_outcomes(&adapters, &[pair("ETHUSDT"), pair("SOLUSDT")])
            .await;
        assert_eq!(outcomes[&ExchangeId::Htx], FetchOutcome::Completed(ExchangeSnapshot::new()));
    }

    #[test]
    fn test_merge_prefers_completed() {
        let failed = FetchOutcome::Failed(ExchangeError::Timeout {
            exchange: "HTX".to_string(),
        });
        let completed = FetchOutcome::Completed(snapshot(&[("BTCUSDT", dec!(1))]));

        assert!(failed.clone().merge(completed.clone()).is_completed());
        assert!(completed.clone().merge(FetchOutcome::TimedOut).is_completed());
        assert_eq!(FetchOutcome::TimedOut.merge(failed.clone()), FetchOutcome::TimedOut);

        let both = completed.merge(FetchOutcome::Completed(snapshot(&[("ETHUSDT", dec!(1))])));
        assert_eq!(both.into_snapshot().map(|s| s.len()), Some(2));
    }
}
