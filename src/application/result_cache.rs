use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::report::CycleReport;

struct CachedReport {
    report: Arc<CycleReport>,
    stored_at: Instant,
    generation: u64,
}

/// Last cycle report with a time-to-live.
///
/// A store swaps the whole entry under the write lock, so readers get either
/// the previous report or the new one.
pub struct ResultCache {
    ttl: Duration,
    slot: RwLock<Option<CachedReport>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn store(&self, report: CycleReport) -> Arc<CycleReport> {
        let report = Arc::new(report);
        let mut slot = self.slot.write().await;
        let generation = slot.as_ref().map_or(1, |cached| cached.generation + 1);
        *slot = Some(CachedReport {
            report: Arc::clone(&report),
            stored_at: Instant::now(),
            generation,
        });
        report
    }

    /// Cached report if it is younger than the TTL
    pub async fn fresh(&self) -> Option<Arc<CycleReport>> {
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|cached| cached.stored_at.elapsed() < self.ttl)
            .map(|cached| Arc::clone(&cached.report))
    }

    /// Cached report regardless of age
    pub async fn last(&self) -> Option<Arc<CycleReport>> {
        self.slot.read().await.as_ref().map(|cached| Arc::clone(&cached.report))
    }

    /// Number of stores so far; changes whenever the cached report is replaced
    pub async fn generation(&self) -> u64 {
        self.slot.read().await.as_ref().map_or(0, |cached| cached.generation)
    }
}
