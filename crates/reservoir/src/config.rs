//! # Engine Configuration
//!
//! One TOML file describes a whole engine: the memory budget, default payload
//! sizes, the maintenance cadence, and every pool to create at startup.
//!
//! ```toml
//! maintenance_interval_ms = 1000
//!
//! [memory]
//! limit_bytes = 67108864
//!
//! [[pools]]
//! name = "sparks"
//! kind = "particle"
//! initial_size = 256
//! max_size = 4096
//! preallocate = true
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reservoir_core::{FactorySettings, MemoryConfig, PoolConfiguration, PoolError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading an engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML did not parse into an [`EngineConfig`].
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values parsed but violate an invariant.
    #[error(transparent)]
    Invalid(#[from] PoolError),
}

impl From<ConfigError> for PoolError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Invalid(inner) => inner,
            other => PoolError::Config(other.to_string()),
        }
    }
}

/// Whole-engine settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Period of the background maintenance cycle. 0 disables the thread.
    pub maintenance_interval_ms: u64,
    /// Length of the analyzer's recent-demand window.
    pub analyzer_window_ms: u64,
    /// Process-wide memory budget.
    pub memory: MemoryConfig,
    /// Payload sizes for the default factory.
    pub factory: FactorySettings,
    /// Pools created at startup.
    pub pools: Vec<PoolConfiguration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            maintenance_interval_ms: 1_000,
            analyzer_window_ms: 5 * 60 * 1_000,
            memory: MemoryConfig::default(),
            factory: FactorySettings::default(),
            pools: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for values that fail validation.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`EngineConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Maintenance period, `None` when disabled.
    #[must_use]
    pub const fn maintenance_interval(&self) -> Option<Duration> {
        if self.maintenance_interval_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.maintenance_interval_ms))
        }
    }

    /// Analyzer window.
    #[inline]
    #[must_use]
    pub const fn analyzer_window(&self) -> Duration {
        Duration::from_millis(self.analyzer_window_ms)
    }

    /// Checks the budget, factory sizes, every pool, and pool name uniqueness.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), PoolError> {
        self.memory.validate()?;
        self.factory.validate()?;
        let mut seen = HashSet::new();
        for pool in &self.pools {
            pool.validate()?;
            if !seen.insert(pool.name.as_str()) {
                return Err(PoolError::PoolAlreadyExists(pool.name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reservoir_core::{RecycleMode, ResourceKind, StrategyKind};

    const SAMPLE: &str = r#"
        maintenance_interval_ms = 250

        [memory]
        limit_bytes = 1048576
        headroom_ratio = 0.75

        [factory]
        buffer_capacity = 512

        [[pools]]
        name = "sparks"
        kind = "particle"
        initial_size = 4
        max_size = 32
        strategy = "lru"

        [[pools]]
        name = "scratch"
        kind = "buffer"
        recycle = "always"
    "#;

    #[test]
    fn test_parse_sample() {
        let config = EngineConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.maintenance_interval(), Some(Duration::from_millis(250)));
        assert_eq!(config.memory.limit_bytes, 1_048_576);
        assert!((config.memory.headroom_ratio - 0.75).abs() < f64::EPSILON);
        assert_eq!(config.factory.buffer_capacity, 512);
        assert_eq!(config.pools.len(), 2);
        assert_eq!(config.pools[0].kind, ResourceKind::Particle);
        assert_eq!(config.pools[0].strategy, StrategyKind::Lru);
        assert_eq!(config.pools[1].recycle, RecycleMode::Always);
        assert_eq!(config.pools[1].max_size, 64);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(
            EngineConfig::from_toml_str("").unwrap(),
            EngineConfig::default()
        );
    }

    #[test]
    fn test_zero_interval_disables_maintenance() {
        let config = EngineConfig::from_toml_str("maintenance_interval_ms = 0").unwrap();
        assert_eq!(config.maintenance_interval(), None);
    }

    #[test]
    fn test_duplicate_pool_names_rejected() {
        let source = r#"
            [[pools]]
            name = "a"
            kind = "handle"
            [[pools]]
            name = "a"
            kind = "buffer"
        "#;
        let err = EngineConfig::from_toml_str(source).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(PoolError::PoolAlreadyExists(ref name)) if name == "a"
        ));
    }

    #[test]
    fn test_overflowing_texture_rejected() {
        let source = r#"
            [factory]
            texture_width = 4294967295
            texture_height = 4294967295
        "#;
        let err = EngineConfig::from_toml_str(source).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(PoolError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_bad_toml_maps_to_config_error() {
        let err: PoolError = EngineConfig::from_toml_str("pools = 3").unwrap_err().into();
        assert!(matches!(err, PoolError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
