//! # RESERVOIR
//!
//! Bounded, budgeted, self-maintaining resource pools.
//!
//! ## Design Principles
//!
//! 1. **Exhaustion is a value** - `acquire` returns `Ok(None)` when a pool or the
//!    budget is full, it never blocks or queues
//! 2. **Release is cheap** - resets are queued and run by maintenance
//! 3. **One budget** - every pool draws from a shared [`MemoryManager`]
//! 4. **External configuration** - whole engines load from TOML
//!
//! ## Example
//!
//! ```rust,ignore
//! use reservoir::{EngineConfig, PoolingEngine};
//!
//! let config = EngineConfig::load("config/reservoir.toml")?;
//! let engine = PoolingEngine::from_config(&config)?;
//!
//! if let Some(handle) = engine.acquire("sparks", None)? {
//!     engine.release("sparks", handle)?;
//! }
//! println!("{}", engine.status().to_toml()?);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod engine;

pub use config::{ConfigError, EngineConfig};
pub use engine::{
    DrainSummary, EngineBuilder, GrowthRecommendation, MaintenanceReport, OptimizationReport,
    PoolOptimization, PoolStatus, PoolingEngine, ResourceHandle, StatusSnapshot,
};

pub use reservoir_core::{
    Clock, CollaboratorError, DefaultFactory, FactorySettings, ManualClock, MemoryConfig,
    MemoryManager, MemoryMetrics, Payload, PoolConfiguration, PoolError, PoolResult, Poolable,
    Prediction, RecycleMode, ResetStrategy, Resource, ResourceFactory, ResourceId, ResourceKind,
    ResourceState, SequentialIds, StrategyKind, SystemClock, Timestamp,
};
