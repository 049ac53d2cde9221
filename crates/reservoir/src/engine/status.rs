//! Point-in-time engine snapshots.

use reservoir_core::{MemoryMetrics, Pool, RecyclerStats, ResourceKind};
use serde::Serialize;

/// Counters for one pool.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PoolStatus {
    /// Pool name.
    pub name: String,
    /// Resource family.
    pub kind: ResourceKind,
    /// Selection policy.
    pub strategy: &'static str,
    /// Resident + recycling + under construction.
    pub len: usize,
    /// Ready to hand out.
    pub available: usize,
    /// Checked out.
    pub in_use: usize,
    /// Waiting in the recycler.
    pub recycling: usize,
    /// Constructions in flight.
    pub constructing: usize,
    /// Configured capacity.
    pub max_size: usize,
    /// Bytes accounted to this pool.
    pub bytes: usize,
    /// Acquires served by reuse.
    pub hits: u64,
    /// Acquires that found nothing to reuse.
    pub misses: u64,
    /// `hits / (hits + misses)`, 0 before the first acquire.
    pub hit_ratio: f64,
    /// `(len - available) / len`.
    pub usage_ratio: f64,
}

impl PoolStatus {
    pub(crate) fn capture(name: &str, pool: &Pool) -> Self {
        Self {
            name: name.to_string(),
            kind: pool.kind(),
            strategy: pool.strategy().name(),
            len: pool.len(),
            available: pool.available_count(),
            in_use: pool.in_use_count(),
            recycling: pool.recycling_count(),
            constructing: pool.constructing_count(),
            max_size: pool.config().max_size,
            bytes: pool.bytes(),
            hits: pool.hits(),
            misses: pool.misses(),
            hit_ratio: hit_ratio(pool.hits(), pool.misses()),
            usage_ratio: pool.usage_ratio(),
        }
    }
}

/// Whole-engine snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Clock reading when the snapshot was taken.
    pub taken_at_ms: u64,
    /// Whether `destroy` has started.
    pub shutting_down: bool,
    /// Global budget.
    pub memory: MemoryMetrics,
    /// Recycler queue and counters.
    pub recycler: RecyclerStats,
    /// Every pool, sorted by name.
    pub pools: Vec<PoolStatus>,
}

impl StatusSnapshot {
    /// Looks up one pool by name.
    #[must_use]
    pub fn pool(&self, name: &str) -> Option<&PoolStatus> {
        self.pools.iter().find(|p| p.name == name)
    }

    /// Renders the snapshot as TOML, for logs and the soak binary.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error if a value cannot be represented.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// `hits / (hits + misses)`, 0 when nothing was requested.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn hit_ratio(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}
