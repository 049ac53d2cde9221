//! # Allocation Strategies
//!
//! Decide which `Available` resource an acquire reuses, how valuable each
//! resource is when the pool shrinks, and whether a released resource should go
//! through the recycler.
//!
//! Strategies only ever see a shared slice of the pool: selection cannot
//! mutate pool state.

mod adaptive;
mod frequency;
mod lru;

pub use adaptive::AdaptiveStrategy;
pub use frequency::FrequencyStrategy;
pub use lru::LruStrategy;

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::resource::{Resource, ResourceState};

/// Pluggable selection policy.
pub trait AllocationStrategy: Send + Sync {
    /// Short policy name for logs and status.
    fn name(&self) -> &'static str;

    /// Index of the `Available` resource to hand out, if any.
    fn select(&self, resources: &[Resource], now: Timestamp) -> Option<usize>;

    /// How valuable a resource is to keep, in `[0, 1]`.
    fn priority(&self, resource: &Resource, now: Timestamp) -> f64;

    /// Whether a released resource should be reset before reuse.
    fn should_recycle(&self, resource: &Resource, now: Timestamp) -> bool;
}

/// Strategy selector used in configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Least recently used first.
    Lru,
    /// Least frequently used first.
    Frequency,
    /// Composite score.
    #[default]
    Adaptive,
}

impl StrategyKind {
    /// Instantiates the strategy with its default tuning.
    #[must_use]
    pub fn build(self) -> Box<dyn AllocationStrategy> {
        match self {
            Self::Lru => Box::new(LruStrategy::default()),
            Self::Frequency => Box::new(FrequencyStrategy::default()),
            Self::Adaptive => Box::new(AdaptiveStrategy),
        }
    }
}

/// Index of the available resource with the smallest key, ties to lowest id.
pub(crate) fn min_available_by<K, F>(resources: &[Resource], key: F) -> Option<usize>
where
    K: PartialOrd,
    F: Fn(&Resource) -> K,
{
    let mut best: Option<(usize, K)> = None;
    for (index, resource) in resources.iter().enumerate() {
        if resource.state() != ResourceState::Available || resource.payload().is_none() {
            continue;
        }
        let k = key(resource);
        let better = match &best {
            None => true,
            Some((best_index, best_key)) => {
                k < *best_key || (k == *best_key && resource.id() < resources[*best_index].id())
            }
        };
        if better {
            best = Some((index, k));
        }
    }
    best.map(|(index, _)| index)
}
