//! Composite-score selection.
//!
//! `score = 0.2·age + 0.3·usage + 0.3·idle + 0.2·size` where every factor is
//! in `[0, 1]` and larger is better:
//!
//! - `age   = 1 / (1 + ageSecs / 60)`
//! - `usage = min(1, usageCount / 10)`
//! - `idle  = 1 / (1 + idleSecs / 30)`
//! - `size  = 1 / (1 + sizeBytes / 1024)`

use super::AllocationStrategy;
use crate::clock::Timestamp;
use crate::resource::{Resource, ResourceState};

/// Picks the highest-scoring available resource. The default strategy.
#[derive(Clone, Copy, Debug, Default)]
pub struct AdaptiveStrategy;

impl AdaptiveStrategy {
    /// Composite score of a resource at `now`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(resource: &Resource, now: Timestamp) -> f64 {
        let age = 1.0 / (1.0 + resource.age_secs(now) / 60.0);
        let usage = (resource.usage_count() as f64 / 10.0).min(1.0);
        let idle = 1.0 / (1.0 + resource.idle_secs(now) / 30.0);
        let size = 1.0 / (1.0 + resource.size_bytes() as f64 / 1024.0);
        0.2 * age + 0.3 * usage + 0.3 * idle + 0.2 * size
    }
}

impl AllocationStrategy for AdaptiveStrategy {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn select(&self, resources: &[Resource], now: Timestamp) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, resource) in resources.iter().enumerate() {
            if resource.state() != ResourceState::Available || resource.payload().is_none() {
                continue;
            }
            let score = Self::score(resource, now);
            let better = match best {
                None => true,
                Some((best_index, best_score)) => {
                    score > best_score
                        || (score == best_score && resource.id() < resources[best_index].id())
                }
            };
            if better {
                best = Some((index, score));
            }
        }
        best.map(|(index, _)| index)
    }

    fn priority(&self, resource: &Resource, now: Timestamp) -> f64 {
        Self::score(resource, now)
    }

    #[allow(clippy::cast_precision_loss)]
    fn should_recycle(&self, resource: &Resource, now: Timestamp) -> bool {
        let age = resource.age_secs(now);
        if age <= 0.0 {
            return false;
        }
        let stale = resource.idle_secs(now) > 60.0;
        let underused = (resource.usage_count() as f64 / age) < 0.01;
        stale && underused
    }
}
