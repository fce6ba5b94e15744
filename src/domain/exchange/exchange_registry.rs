//! Registry of exchange adapters keyed by exchange

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{ExchangeAdapter, ExchangeId};
use crate::shared::errors::AppError;

/// Lookup table from exchange to its adapter
#[derive(Clone, Default)]
pub struct ExchangeRegistry {
    adapters: BTreeMap<ExchangeId, Arc<dyn ExchangeAdapter>>,
}

impl ExchangeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, replacing any previous one for the same exchange
    pub fn register(&mut self, adapter: Arc<dyn ExchangeAdapter>) {
        self.adapters.insert(adapter.id(), adapter);
    }

    pub fn get(&self, id: ExchangeId) -> Option<Arc<dyn ExchangeAdapter>> {
        self.adapters.get(&id).cloned()
    }

    /// Exchanges with a registered adapter, in key order
    pub fn exchanges(&self) -> Vec<ExchangeId> {
        self.adapters.keys().copied().collect()
    }

    pub fn is_supported(&self, id: ExchangeId) -> bool {
        self.adapters.contains_key(&id)
    }

    /// Adapters for the selected exchanges; every selection must be registered
    pub fn select(&self, selection: &[ExchangeId]) -> Result<Vec<Arc<dyn ExchangeAdapter>>, AppError> {
        let mut selected: Vec<ExchangeId> = selection.to_vec();
        selected.sort();
        selected.dedup();
        selected
            .into_iter()
            .map(|id| {
                self.get(id)
                    .ok_or_else(|| AppError::UnsupportedExchange(id.key().to_string()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
