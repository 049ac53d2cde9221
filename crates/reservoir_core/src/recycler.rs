//! # Recycler
//!
//! Resets released resources before they are reused.
//!
//! `enqueue` is O(1) and never runs cleanup; all reset work happens in
//! [`Recycler::drain`], which the engine calls from its maintenance cycle.
//!
//! ```text
//!  release ──▶ enqueue ──▶ [ FIFO ] ──drain──▶ validate ─▶ cleanup ─▶ canonical?
//!                                                 │           │           │
//!                                                 └── fail ───┴── fail ───┴──▶ Disposed
//!                                                                         ok ─▶ Available
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::PoolError;
use crate::pool::Pool;
use crate::resource::{Poolable, Resource, ResourceKind, ResourceState, Retired};

/// Per-kind reset logic.
pub trait ResetStrategy: Send + Sync {
    /// Whether the resource is fit to be reset at all.
    fn validate(&self, resource: &Resource) -> bool;

    /// Resets the payload to its canonical empty state. Must be idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::CleanupFailed`] when the payload cannot be reset.
    fn cleanup(&self, resource: &mut Resource) -> Result<(), PoolError>;
}

/// Default reset: payload must match the resource's kind, then reset through
/// [`Poolable::reset`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CanonicalReset;

impl ResetStrategy for CanonicalReset {
    fn validate(&self, resource: &Resource) -> bool {
        resource.size_bytes() > 0
            && resource
                .payload()
                .is_some_and(|payload| payload.kind() == resource.kind())
    }

    fn cleanup(&self, resource: &mut Resource) -> Result<(), PoolError> {
        let id = resource.id().to_string();
        let payload = resource.payload_mut().ok_or_else(|| PoolError::CleanupFailed {
            resource: id,
            reason: "no payload to reset".to_string(),
        })?;
        payload.reset();
        Ok(())
    }
}

/// Why the recycler gave up on a resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisposeReason {
    /// Pre-cleanup validation failed.
    ValidationFailed,
    /// Cleanup returned an error.
    CleanupFailed(String),
    /// Cleanup succeeded but left a non-canonical payload.
    NotCanonical,
}

/// What happened to one queued resource.
#[derive(Debug)]
pub enum RecycleResult {
    /// Reset and `Available` again.
    Recycled,
    /// Dropped; `Disposed`.
    Disposed(DisposeReason),
}

/// A drained queue entry, handed back to the owning pool.
#[derive(Debug)]
pub struct RecycleOutcome {
    /// Name of the pool the resource came from.
    pub pool: String,
    /// [`Pool::serial`] of that pool. A pool recreated under the same name
    /// does not match.
    pub pool_serial: u64,
    /// The resource, `Available` or `Disposed`.
    pub resource: Resource,
    /// What happened.
    pub result: RecycleResult,
}

/// Recycler counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RecyclerStats {
    /// Resources waiting to be drained.
    pub queue_depth: usize,
    /// Resources ever enqueued.
    pub enqueued: u64,
    /// Resources returned to service.
    pub recycled: u64,
    /// Resources disposed during drain.
    pub disposed: u64,
}

struct Entry {
    pool: String,
    pool_serial: u64,
    resource: Resource,
}

/// FIFO of resources awaiting reset, with per-kind reset strategies.
pub struct Recycler {
    queue: Mutex<VecDeque<Entry>>,
    strategies: HashMap<ResourceKind, Arc<dyn ResetStrategy>>,
    fallback: Arc<dyn ResetStrategy>,
    enqueued: AtomicU64,
    recycled: AtomicU64,
    disposed: AtomicU64,
}

impl std::fmt::Debug for Recycler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recycler")
            .field("queue_depth", &self.queue_depth())
            .field("custom_kinds", &self.strategies.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Recycler {
    fn default() -> Self {
        Self::new()
    }
}

impl Recycler {
    /// Creates a recycler using [`CanonicalReset`] for every kind.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            strategies: HashMap::new(),
            fallback: Arc::new(CanonicalReset),
            enqueued: AtomicU64::new(0),
            recycled: AtomicU64::new(0),
            disposed: AtomicU64::new(0),
        }
    }

    /// Overrides the reset strategy for one kind.
    #[must_use]
    pub fn with_strategy(mut self, kind: ResourceKind, strategy: Arc<dyn ResetStrategy>) -> Self {
        self.strategies.insert(kind, strategy);
        self
    }

    fn strategy_for(&self, kind: ResourceKind) -> &dyn ResetStrategy {
        match self.strategies.get(&kind) {
            Some(strategy) => &**strategy,
            None => &*self.fallback,
        }
    }

    /// Queues a resource detached from `pool` for reset. Expects `Recycling`.
    pub fn enqueue(&self, pool: &Pool, resource: Resource) {
        debug_assert_eq!(resource.state(), ResourceState::Recycling);
        self.queue.lock().push_back(Entry {
            pool: pool.config().name.clone(),
            pool_serial: pool.serial(),
            resource,
        });
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Resources waiting.
    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.queue.lock().len()
    }

    /// Resets everything queued so far.
    ///
    /// The queue lock is held only while popping; cleanup runs unlocked so new
    /// releases are never blocked behind it.
    pub fn drain(&self) -> Vec<RecycleOutcome> {
        let batch: Vec<Entry> = self.queue.lock().drain(..).collect();
        batch.into_iter().map(|entry| self.process(entry)).collect()
    }

    fn process(&self, entry: Entry) -> RecycleOutcome {
        let Entry {
            pool,
            pool_serial,
            mut resource,
        } = entry;
        let strategy = self.strategy_for(resource.kind());
        let verdict = if !strategy.validate(&resource) {
            Err(DisposeReason::ValidationFailed)
        } else if let Err(err) = strategy.cleanup(&mut resource) {
            Err(DisposeReason::CleanupFailed(err.to_string()))
        } else if !resource.payload().is_some_and(Poolable::is_reset) {
            Err(DisposeReason::NotCanonical)
        } else {
            Ok(())
        };

        let result = match verdict {
            Ok(()) => {
                resource.finish_recycle();
                self.recycled.fetch_add(1, Ordering::Relaxed);
                RecycleResult::Recycled
            }
            Err(reason) => {
                tracing::warn!(
                    "recycle of {} in {} failed ({:?}), disposing",
                    resource.id(),
                    pool,
                    reason
                );
                resource.dispose();
                self.disposed.fetch_add(1, Ordering::Relaxed);
                RecycleResult::Disposed(reason)
            }
        };
        RecycleOutcome {
            pool,
            pool_serial,
            resource,
            result,
        }
    }

    /// Empties the queue without resetting anything. Used by teardown.
    pub fn clear(&self) -> Vec<(String, Retired)> {
        let drained: Vec<Entry> = self.queue.lock().drain(..).collect();
        drained
            .into_iter()
            .map(|entry| {
                let retired = entry
                    .resource
                    .retire()
                    .unwrap_or_else(Resource::force_retire);
                (entry.pool, retired)
            })
            .collect()
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> RecyclerStats {
        RecyclerStats {
            queue_depth: self.queue_depth(),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            recycled: self.recycled.load(Ordering::Relaxed),
            disposed: self.disposed.load(Ordering::Relaxed),
        }
    }
}
