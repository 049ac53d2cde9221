//! Least-frequently-used selection. Spreads wear across the pool.

use super::{min_available_by, AllocationStrategy};
use crate::clock::Timestamp;
use crate::resource::Resource;

/// Hands out the resource with the fewest lifetime uses.
#[derive(Clone, Debug)]
pub struct FrequencyStrategy {
    /// Lifetime uses beyond which a released resource is reset.
    pub usage_cap: u64,
}

impl Default for FrequencyStrategy {
    fn default() -> Self {
        Self { usage_cap: 100 }
    }
}

impl AllocationStrategy for FrequencyStrategy {
    fn name(&self) -> &'static str {
        "frequency"
    }

    fn select(&self, resources: &[Resource], _now: Timestamp) -> Option<usize> {
        min_available_by(resources, Resource::usage_count)
    }

    #[allow(clippy::cast_precision_loss)]
    fn priority(&self, resource: &Resource, _now: Timestamp) -> f64 {
        (resource.usage_count() as f64 / 10.0).min(1.0)
    }

    fn should_recycle(&self, resource: &Resource, _now: Timestamp) -> bool {
        resource.usage_count() > self.usage_cap
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::resource;
    use super::*;

    #[test]
    fn test_selects_least_used() {
        let pool = vec![
            resource("a", 0, 0, 7, 64),
            resource("b", 0, 0, 2, 64),
            resource("c", 0, 0, 2, 64),
        ];
        assert_eq!(FrequencyStrategy::default().select(&pool, Timestamp(1)), Some(1));
    }

    #[test]
    fn test_recycle_cap() {
        let f = FrequencyStrategy { usage_cap: 3 };
        assert!(!f.should_recycle(&resource("a", 0, 0, 3, 64), Timestamp(1)));
        assert!(f.should_recycle(&resource("a", 0, 0, 4, 64), Timestamp(1)));
    }
}
