use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::application::fetch_coordinator::{CoordinatorConfig, FetchCoordinator, FetchMode};
use crate::application::result_cache::ResultCache;
use crate::domain::arbitrage::{detect_all, rank, DetectorConfig};
use crate::domain::exchange::{ExchangeAdapter, ExchangeId, ExchangeRegistry};
use crate::domain::market::{aggregate, discover_pairs, CycleSnapshots};
use crate::report::{CycleMeta, CycleReport};
use crate::shared::errors::AppError;
use crate::shared::types::CanonicalPair;

/// Monitoring configuration
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub exchanges: Vec<ExchangeId>,
    pub pairs: Vec<CanonicalPair>,
    pub detector: DetectorConfig,
    pub coordinator: CoordinatorConfig,
    pub poll_interval: Duration,
    pub cache_ttl: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            exchanges: ExchangeId::ALL.to_vec(),
            pairs: Vec::new(),
            detector: DetectorConfig::default(),
            coordinator: CoordinatorConfig::default(),
            poll_interval: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(30),
        }
    }
}

/// Runs detection cycles over the selected exchanges and keeps the last report
pub struct ArbitrageMonitor {
    settings: MonitorSettings,
    adapters: Vec<Arc<dyn ExchangeAdapter>>,
    coordinator: FetchCoordinator,
    cache: ResultCache,
    refresh_lock: Mutex<()>,
}

impl ArbitrageMonitor {
    /// Fails if a selected exchange has no adapter in the registry
    pub fn new(registry: &ExchangeRegistry, settings: MonitorSettings) -> Result<Self, AppError> {
        let adapters = registry.select(&settings.exchanges)?;
        if adapters.is_empty() {
            return Err(AppError::ConfigError("no exchanges selected".to_string()));
        }

        Ok(Self {
            coordinator: FetchCoordinator::new(settings.coordinator.clone()),
            cache: ResultCache::new(settings.cache_ttl),
            refresh_lock: Mutex::new(()),
            adapters,
            settings,
        })
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// One full pass: fan out, aggregate, detect, rank. Never fails; exchanges
    /// that did not answer are reported through the stats.
    pub async fn run_cycle(&self) -> CycleReport {
        let started = Instant::now();
        let pairs = &self.settings.pairs;

        let outcomes = self.coordinator.gather_with_outcomes(&self.adapters, pairs).await;
        let snapshots: CycleSnapshots = outcomes
            .into_iter()
            .filter_map(|(exchange, outcome)| outcome.into_snapshot().map(|s| (exchange, s)))
            .collect();

        let quote_sets = aggregate(&snapshots, pairs);
        for quotes in &quote_sets {
            debug!("{}: quoted on {} exchanges", quotes.pair, quotes.exchange_count());
        }
        let opportunities = rank(detect_all(&quote_sets, &self.settings.detector));

        let report = CycleReport::new(
            opportunities,
            CycleMeta {
                pairs_analyzed: pairs.len(),
                exchanges_requested: self.adapters.len(),
                exchanges_responded: snapshots.len(),
                elapsed: started.elapsed(),
            },
        );

        if snapshots.is_empty() {
            warn!("⚠️ No exchange returned data this cycle");
        }
        info!(
            "🎯 Cycle done: {} opportunities (max spread {:.4}%) from {}/{} exchanges in {}ms",
            report.stats.spread.count,
            report.stats.spread.max_spread.round_dp(4),
            report.stats.exchanges_responded,
            report.stats.exchanges_requested,
            report.stats.elapsed_ms
        );
        report
    }

    /// Run a cycle and cache it.
    ///
    /// Only one cycle runs at a time. A caller that arrives while one is in
    /// flight waits for it and gets its report instead of starting another.
    pub async fn refresh(&self) -> Arc<CycleReport> {
        let seen = self.cache.generation().await;
        let _guard = self.refresh_lock.lock().await;

        if self.cache.generation().await != seen {
            if let Some(report) = self.cache.last().await {
                debug!("Serving report from a refresh that finished while waiting");
                return report;
            }
        }

        let report = self.run_cycle().await;
        self.cache.store(report).await
    }

    /// Cached report if still within its TTL
    pub async fn latest(&self) -> Option<Arc<CycleReport>> {
        self.cache.fresh().await
    }

    /// Cached report if fresh, otherwise a new cycle
    pub async fn get_or_refresh(&self) -> Arc<CycleReport> {
        match self.latest().await {
            Some(report) => report,
            None => self.refresh().await,
        }
    }

    /// Pairs listed on at least `min_coverage` of the selected exchanges,
    /// from one bulk fetch per exchange
    pub async fn discover(&self, min_coverage: usize) -> Vec<CanonicalPair> {
        let coordinator = FetchCoordinator::new(CoordinatorConfig {
            mode: FetchMode::AllTickers,
            ..self.settings.coordinator.clone()
        });
        let snapshots = coordinator.gather(&self.adapters, &[]).await;
        let pairs = discover_pairs(&snapshots, min_coverage);
        info!(
            "🔍 {} pairs listed on at least {} of {} responding exchanges",
            pairs.len(),
            min_coverage,
            snapshots.len()
        );
        pairs
    }

    /// Refresh on a fixed interval until the returned handle is stopped
    pub fn spawn_polling(self: &Arc<Self>) -> PollingHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let (reports_tx, reports_rx) = watch::channel(None);
        let monitor = Arc::clone(self);
        let interval = self.settings.poll_interval;

        let join = tokio::spawn(async move {
            info!("🚀 Polling every {:?}", interval);
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = monitor.refresh().await;
                        let _ = reports_tx.send(Some(report));
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("🛑 Polling stopped");
        });

        PollingHandle {
            shutdown: shutdown_tx,
            reports: reports_rx,
            join,
        }
    }
}

/// Owner of a running polling task
pub struct PollingHandle {
    shutdown: watch::Sender<bool>,
    reports: watch::Receiver<Option<Arc<CycleReport>>>,
    join: JoinHandle<()>,
}

impl PollingHandle {
    /// Receiver that sees every report the task publishes
    pub fn reports(&self) -> watch::Receiver<Option<Arc<CycleReport>>> {
        self.reports.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.join.is_finished()
    }

    /// Signal the task and wait for it to finish its current cycle
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            warn!("⚠️ Polling task ended abnormally: {}", e);
        }
    }
}
