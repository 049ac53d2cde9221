//! Least-recently-used selection.

use std::time::Duration;

use super::{min_available_by, AllocationStrategy};
use crate::clock::Timestamp;
use crate::resource::Resource;

/// Hands out the resource idle the longest.
#[derive(Clone, Debug)]
pub struct LruStrategy {
    /// Idle time beyond which a released resource is reset.
    pub recycle_after: Duration,
}

impl Default for LruStrategy {
    fn default() -> Self {
        Self {
            recycle_after: Duration::from_secs(30),
        }
    }
}

impl AllocationStrategy for LruStrategy {
    fn name(&self) -> &'static str {
        "lru"
    }

    fn select(&self, resources: &[Resource], _now: Timestamp) -> Option<usize> {
        min_available_by(resources, Resource::last_used_at)
    }

    fn priority(&self, resource: &Resource, now: Timestamp) -> f64 {
        1.0 / (1.0 + resource.idle_secs(now) / 30.0)
    }

    fn should_recycle(&self, resource: &Resource, now: Timestamp) -> bool {
        now.saturating_since(resource.last_used_at()) > self.recycle_after
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{resource, secs};
    use super::*;

    #[test]
    fn test_selects_oldest_use() {
        let pool = vec![
            resource("a", 0, 5_000, 1, 64),
            resource("b", 0, 1_000, 1, 64),
            resource("c", 0, 9_000, 1, 64),
        ];
        assert_eq!(LruStrategy::default().select(&pool, Timestamp(10_000)), Some(1));
    }

    #[test]
    fn test_ties_go_to_lowest_id() {
        let pool = vec![resource("b", 0, 0, 0, 64), resource("a", 0, 0, 0, 64)];
        assert_eq!(LruStrategy::default().select(&pool, Timestamp(1)), Some(1));
    }

    #[test]
    fn test_recycles_after_idle_threshold() {
        let lru = LruStrategy::default();
        let r = resource("a", 0, 0, 1, 64);
        assert!(!lru.should_recycle(&r, secs(30)));
        assert!(lru.should_recycle(&r, secs(31)));
    }

    #[test]
    fn test_priority_decays_with_idle_time() {
        let lru = LruStrategy::default();
        let r = resource("a", 0, 0, 1, 64);
        assert!(lru.priority(&r, secs(0)) > lru.priority(&r, secs(60)));
    }
}
