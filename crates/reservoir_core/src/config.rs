//! # Pool Configuration
//!
//! Per-pool and budget settings. Everything here derives `Deserialize` so a
//! whole engine can be described in one TOML file; durations are plain
//! millisecond fields.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PoolError, PoolResult};
use crate::resource::ResourceKind;
use crate::strategy::StrategyKind;

/// What happens to a resource when it is released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecycleMode {
    /// Ask the pool's allocation strategy (`should_recycle`).
    #[default]
    Strategy,
    /// Always queue for reset.
    Always,
    /// Never reset; reuse as-is.
    Never,
}

/// Configuration of a single pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfiguration {
    /// Pool name.
    pub name: String,
    /// Resource family held by the pool.
    pub kind: ResourceKind,
    /// Floor the pool never shrinks below; preallocation target.
    pub initial_size: usize,
    /// Hard cap on resources (resident + recycling + under construction).
    pub max_size: usize,
    /// Multiplier applied to the pool size in growth recommendations (> 1).
    pub growth_factor: f64,
    /// Usage ratio under which the pool shrinks, in `(0, 1)`.
    pub shrink_threshold: f64,
    /// Idle time after which an available resource is evicted.
    pub max_idle_time_ms: u64,
    /// Minimum time between maintenance passes over this pool.
    pub cleanup_interval_ms: u64,
    /// Byte cap for this pool, on top of the global budget.
    pub memory_limit_bytes: usize,
    /// Build `initial_size` resources at creation.
    pub preallocate: bool,
    /// Selection policy.
    pub strategy: StrategyKind,
    /// Release behaviour.
    pub recycle: RecycleMode,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: ResourceKind::Buffer,
            initial_size: 8,
            max_size: 64,
            growth_factor: 1.5,
            shrink_threshold: 0.3,
            max_idle_time_ms: 60_000,
            cleanup_interval_ms: 5_000,
            memory_limit_bytes: 16 * 1024 * 1024,
            preallocate: false,
            strategy: StrategyKind::default(),
            recycle: RecycleMode::default(),
        }
    }
}

impl PoolConfiguration {
    /// Default configuration for a named pool of `kind`.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    /// Idle eviction threshold.
    #[inline]
    #[must_use]
    pub const fn max_idle_time(&self) -> Duration {
        Duration::from_millis(self.max_idle_time_ms)
    }

    /// Maintenance cadence.
    #[inline]
    #[must_use]
    pub const fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }

    /// Checks every invariant the pool relies on.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] naming the first violation.
    pub fn validate(&self) -> PoolResult<()> {
        let invalid = |msg: String| Err(PoolError::InvalidConfiguration(msg));

        if self.name.trim().is_empty() {
            return invalid("pool name must not be empty".to_string());
        }
        if self.max_size == 0 {
            return invalid(format!("{}: max_size must be greater than 0", self.name));
        }
        if self.max_size < self.initial_size {
            return invalid(format!(
                "{}: max_size ({}) must not be below initial_size ({})",
                self.name, self.max_size, self.initial_size
            ));
        }
        if !(self.growth_factor > 1.0 && self.growth_factor.is_finite()) {
            return invalid(format!(
                "{}: growth_factor must be greater than 1, got {}",
                self.name, self.growth_factor
            ));
        }
        if !(self.shrink_threshold > 0.0 && self.shrink_threshold < 1.0) {
            return invalid(format!(
                "{}: shrink_threshold must be in (0, 1), got {}",
                self.name, self.shrink_threshold
            ));
        }
        if self.max_idle_time_ms == 0 {
            return invalid(format!("{}: max_idle_time_ms must be positive", self.name));
        }
        if self.memory_limit_bytes == 0 {
            return invalid(format!("{}: memory_limit_bytes must be positive", self.name));
        }
        Ok(())
    }
}

/// Settings for the process-wide memory budget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Total bytes all pools may account for.
    pub limit_bytes: usize,
    /// Fraction of the limit usable before admission is refused outright.
    pub headroom_ratio: f64,
    /// Number of recent allocation sizes kept for trend estimation.
    pub window_size: usize,
    /// Samples needed before the trend departs from 1.0.
    pub min_trend_samples: usize,
    /// Lower clamp of the trend factor.
    pub trend_min: f64,
    /// Upper clamp of the trend factor.
    pub trend_max: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            limit_bytes: 64 * 1024 * 1024,
            headroom_ratio: 0.8,
            window_size: 100,
            min_trend_samples: 8,
            trend_min: 0.5,
            trend_max: 2.0,
        }
    }
}

impl MemoryConfig {
    /// Default budget with a specific limit.
    #[must_use]
    pub fn with_limit(limit_bytes: usize) -> Self {
        Self {
            limit_bytes,
            ..Self::default()
        }
    }

    /// Checks the budget settings.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] naming the first violation.
    pub fn validate(&self) -> PoolResult<()> {
        if !(self.headroom_ratio > 0.0 && self.headroom_ratio <= 1.0) {
            return Err(PoolError::InvalidConfiguration(format!(
                "headroom_ratio must be in (0, 1], got {}",
                self.headroom_ratio
            )));
        }
        if self.window_size < 2 {
            return Err(PoolError::InvalidConfiguration(
                "window_size must be at least 2".to_string(),
            ));
        }
        if !(self.trend_min > 0.0 && self.trend_min <= self.trend_max) {
            return Err(PoolError::InvalidConfiguration(format!(
                "trend range [{}, {}] is empty or non-positive",
                self.trend_min, self.trend_max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        PoolConfiguration::new("p", ResourceKind::Particle)
            .validate()
            .unwrap();
        MemoryConfig::default().validate().unwrap();
    }

    #[test]
    fn test_max_below_initial_is_rejected() {
        let config = PoolConfiguration {
            initial_size: 10,
            max_size: 4,
            ..PoolConfiguration::new("p", ResourceKind::Buffer)
        };
        assert!(matches!(
            config.validate(),
            Err(PoolError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_zero_sizes_are_rejected() {
        let config = PoolConfiguration {
            initial_size: 0,
            max_size: 0,
            ..PoolConfiguration::new("p", ResourceKind::Buffer)
        };
        assert!(config.validate().is_err());

        let config = PoolConfiguration {
            memory_limit_bytes: 0,
            ..PoolConfiguration::new("p", ResourceKind::Buffer)
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_factor_ranges() {
        let base = PoolConfiguration::new("p", ResourceKind::Buffer);
        assert!(PoolConfiguration { growth_factor: 1.0, ..base.clone() }.validate().is_err());
        assert!(PoolConfiguration { shrink_threshold: 1.0, ..base.clone() }.validate().is_err());
        assert!(PoolConfiguration { shrink_threshold: 0.0, ..base }.validate().is_err());
    }

    #[test]
    fn test_parse_from_toml() {
        let config: PoolConfiguration = toml::from_str(
            r#"
            name = "sparks"
            kind = "particle"
            initial_size = 4
            max_size = 16
            strategy = "lru"
            recycle = "always"
            preallocate = true
            "#,
        )
        .unwrap();
        assert_eq!(config.kind, ResourceKind::Particle);
        assert_eq!(config.strategy, StrategyKind::Lru);
        assert_eq!(config.recycle, RecycleMode::Always);
        assert_eq!(config.max_idle_time_ms, 60_000);
        config.validate().unwrap();
    }
}
