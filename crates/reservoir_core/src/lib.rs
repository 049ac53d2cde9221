//! # RESERVOIR Core
//!
//! The model and policies behind RESERVOIR's resource pools.
//!
//! ## Design Principles
//!
//! 1. **Explicit lifecycle** - every resource moves through a checked state machine
//! 2. **Bounded pools** - capacity is reserved before anything is built
//! 3. **Budgeted memory** - admission looks at both headroom and the allocation trend
//! 4. **Deferred cleanup** - release is O(1); resets happen in the recycler drain
//!
//! ## Thread Safety
//!
//! [`Pool`] is single-threaded storage. [`MemoryManager`], [`Recycler`] and
//! [`UsagePatternAnalyzer`] lock internally and are shared across pools by the
//! engine crate.
//!
//! ## Example
//!
//! ```rust,ignore
//! use reservoir_core::{Pool, PoolConfiguration, ResourceKind, Timestamp};
//!
//! let mut pool = Pool::new(PoolConfiguration::new("sparks", ResourceKind::Particle))?;
//! if let Some((id, payload)) = pool.check_out(Timestamp(0)) {
//!     pool.check_in(&id, payload, Timestamp(1)).ok();
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod analyzer;
pub mod clock;
pub mod config;
pub mod error;
pub mod factory;
pub mod id;
pub mod memory;
pub mod pool;
pub mod recycler;
pub mod resource;
pub mod strategy;

pub use analyzer::{Prediction, TimeSlot, UsagePatternAnalyzer};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::{MemoryConfig, PoolConfiguration, RecycleMode};
pub use error::{CollaboratorError, PoolError, PoolResult};
pub use factory::{DefaultFactory, FactorySettings, ResourceFactory};
pub use id::{IdSource, RandomIds, ResourceId, SequentialIds};
pub use memory::{MemoryManager, MemoryMetrics};
pub use pool::Pool;
pub use recycler::{
    CanonicalReset, DisposeReason, RecycleOutcome, RecycleResult, Recycler, RecyclerStats,
    ResetStrategy,
};
pub use resource::{
    BufferPayload, HandlePayload, ParticlePayload, Payload, Poolable, Resource, ResourceKind,
    ResourceState, Retired, TextureFormat, TexturePayload,
};
pub use strategy::{
    AdaptiveStrategy, AllocationStrategy, FrequencyStrategy, LruStrategy, StrategyKind,
};
