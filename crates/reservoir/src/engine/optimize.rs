//! # Pool Optimization
//!
//! One pass over a pool:
//!
//! 1. evict `Available` resources idle past `max_idle_time`
//! 2. shrink an underused pool toward `max(initial_size, ceil(len * 0.8))`, or
//!    record a growth recommendation for a busy one
//! 3. defragment and refresh priorities
//!
//! Growth is never applied here: the next misses construct on demand, and the
//! recommendation only says how large the pool is expected to get.

use parking_lot::Mutex;
use reservoir_core::{Pool, Prediction, Retired, Timestamp};
use serde::Serialize;

/// Usage ratio above which a pool is considered busy.
pub const GROWTH_USAGE_RATIO: f64 = 0.8;

/// Fraction of the pool kept by a single shrink step, as `KEEP_NUM / KEEP_DEN`.
const KEEP_NUM: usize = 4;
const KEEP_DEN: usize = 5;

/// A pool that would benefit from more resources.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GrowthRecommendation {
    /// Pool name.
    pub pool: String,
    /// Size when the recommendation was made.
    pub current_size: usize,
    /// Suggested size, capped at `max_size`.
    pub target_size: usize,
    /// Analyzer's predicted demand.
    pub predicted_demand: usize,
    /// Analyzer's confidence in that prediction.
    pub confidence: f64,
}

/// What one optimization pass did to one pool.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PoolOptimization {
    /// Pool name.
    pub pool: String,
    /// Size before the pass.
    pub len_before: usize,
    /// Size after the pass.
    pub len_after: usize,
    /// Usage ratio after idle eviction.
    pub usage_ratio: f64,
    /// Resources evicted for idleness.
    pub evicted_idle: usize,
    /// Resources evicted by shrinking.
    pub shrunk: usize,
    /// Bytes returned to the budget.
    pub bytes_released: usize,
}

/// Result of [`crate::PoolingEngine::optimize`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OptimizationReport {
    /// Per-pool results, sorted by pool name.
    pub pools: Vec<PoolOptimization>,
    /// Pools that look undersized.
    pub growth: Vec<GrowthRecommendation>,
}

impl OptimizationReport {
    /// Total resources evicted for idleness.
    #[must_use]
    pub fn evicted_idle(&self) -> usize {
        self.pools.iter().map(|p| p.evicted_idle).sum()
    }

    /// Total resources evicted by shrinking.
    #[must_use]
    pub fn shrunk(&self) -> usize {
        self.pools.iter().map(|p| p.shrunk).sum()
    }

    /// Total bytes returned to the budget.
    #[must_use]
    pub fn bytes_released(&self) -> usize {
        self.pools.iter().map(|p| p.bytes_released).sum()
    }
}

/// Shrink target for an underused pool.
#[must_use]
pub fn shrink_target(len: usize, initial_size: usize) -> usize {
    (len * KEEP_NUM).div_ceil(KEEP_DEN).max(initial_size)
}

/// Growth target for a busy pool, capped at `max_size`.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn growth_target(len: usize, growth_factor: f64, predicted: usize, max_size: usize) -> usize {
    let grown = (len as f64 * growth_factor).ceil() as usize;
    grown.max(predicted).min(max_size)
}

/// Runs one pass over `pool`. Evicted resources are returned unlocked for
/// the caller to release and clean up.
pub(crate) fn optimize_pool(
    name: &str,
    pool: &Mutex<Pool>,
    prediction: &Prediction,
    now: Timestamp,
) -> (PoolOptimization, Option<GrowthRecommendation>, Vec<Retired>) {
    let mut pool = pool.lock();
    let config = pool.config().clone();
    let len_before = pool.len();

    let mut evicted = pool.evict_idle(now);
    let evicted_idle = evicted.len();

    let len = pool.len();
    let usage_ratio = pool.usage_ratio();
    let mut growth = None;
    let mut shrunk = 0;

    if usage_ratio < config.shrink_threshold && len > config.initial_size {
        let target = shrink_target(len, config.initial_size);
        let victims = pool.evict_least_valuable(len.saturating_sub(target), now);
        shrunk = victims.len();
        evicted.extend(victims);
    } else if usage_ratio > GROWTH_USAGE_RATIO && len < config.max_size {
        let target = growth_target(len, config.growth_factor, prediction.count, config.max_size);
        if target > len {
            growth = Some(GrowthRecommendation {
                pool: name.to_string(),
                current_size: len,
                target_size: target,
                predicted_demand: prediction.count,
                confidence: prediction.confidence,
            });
        }
    }

    pool.defragment(now);
    pool.mark_maintained(now);

    let report = PoolOptimization {
        pool: name.to_string(),
        len_before,
        len_after: pool.len(),
        usage_ratio,
        evicted_idle,
        shrunk,
        bytes_released: evicted.iter().map(|r| r.resource.size_bytes()).sum(),
    };
    (report, growth, evicted)
}
