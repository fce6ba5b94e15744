//! Market domain - joining per-exchange snapshots into per-pair quote sets

mod coverage;
mod quotes;

pub use coverage::{discover_pairs, pair_coverage};
pub use quotes::{aggregate, AggregatedQuoteSet};

use std::collections::HashMap;

use crate::domain::exchange::ExchangeId;
use crate::shared::types::ExchangeSnapshot;

/// Snapshots collected in one cycle; exchanges that produced nothing are absent
pub type CycleSnapshots = HashMap<ExchangeId, ExchangeSnapshot>;
