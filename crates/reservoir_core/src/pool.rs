//! # Pool Storage
//!
//! A bounded multiset of resources of one kind, plus the bookkeeping that keeps
//! the capacity invariant true while resources are away from the pool.
//!
//! ## Capacity
//!
//! `len()` counts three groups:
//! - resident resources (`Available` or `InUse`)
//! - resources detached into the recycler queue
//! - slots reserved for constructions in flight
//!
//! Every insertion path reserves first, so `len() <= max_size` always holds.
//!
//! # Thread Safety
//!
//! This pool is NOT thread-safe. The engine wraps each pool in a mutex.

use std::cmp::Ordering;
use std::sync::atomic::{self, AtomicU64};

use crate::clock::Timestamp;
use crate::config::{PoolConfiguration, RecycleMode};
use crate::error::PoolResult;
use crate::id::ResourceId;
use crate::resource::{Payload, Resource, ResourceKind, ResourceState, Retired};
use crate::strategy::AllocationStrategy;

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// A pool of interchangeable resources sharing one configuration.
pub struct Pool {
    /// Process-unique; a pool recreated under the same name gets a new one.
    serial: u64,
    config: PoolConfiguration,
    strategy: Box<dyn AllocationStrategy>,
    /// Resident resources.
    resources: Vec<Resource>,
    /// Resources currently owned by the recycler queue.
    recycling: usize,
    /// Slots reserved for constructions in flight.
    constructing: usize,
    /// Accounted bytes across all three groups.
    bytes: usize,
    hits: u64,
    misses: u64,
    closed: bool,
    last_maintained: Option<Timestamp>,
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.config.name)
            .field("serial", &self.serial)
            .field("strategy", &self.strategy.name())
            .field("resident", &self.resources.len())
            .field("recycling", &self.recycling)
            .field("constructing", &self.constructing)
            .field("bytes", &self.bytes)
            .finish()
    }
}

impl Pool {
    /// Creates an empty pool.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PoolError::InvalidConfiguration`] if the configuration
    /// fails validation.
    pub fn new(config: PoolConfiguration) -> PoolResult<Self> {
        config.validate()?;
        let strategy = config.strategy.build();
        Ok(Self {
            serial: NEXT_SERIAL.fetch_add(1, atomic::Ordering::Relaxed),
            resources: Vec::with_capacity(config.initial_size),
            config,
            strategy,
            recycling: 0,
            constructing: 0,
            bytes: 0,
            hits: 0,
            misses: 0,
            closed: false,
            last_maintained: None,
        })
    }

    /// Identity of this pool instance, distinct from every other pool's.
    #[inline]
    #[must_use]
    pub const fn serial(&self) -> u64 {
        self.serial
    }

    /// Pool configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PoolConfiguration {
        &self.config
    }

    /// Resource family.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.config.kind
    }

    /// Active strategy.
    #[inline]
    #[must_use]
    pub fn strategy(&self) -> &dyn AllocationStrategy {
        self.strategy.as_ref()
    }

    /// Resident + recycling + under construction.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len() + self.recycling + self.constructing
    }

    /// True when the pool holds nothing at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resident resources.
    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Resources ready to hand out.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.count_in(ResourceState::Available)
    }

    /// Resources checked out by callers.
    #[must_use]
    pub fn in_use_count(&self) -> usize {
        self.count_in(ResourceState::InUse)
    }

    /// Resources waiting in the recycler.
    #[inline]
    #[must_use]
    pub const fn recycling_count(&self) -> usize {
        self.recycling
    }

    /// Constructions in flight.
    #[inline]
    #[must_use]
    pub const fn constructing_count(&self) -> usize {
        self.constructing
    }

    /// Accounted bytes.
    #[inline]
    #[must_use]
    pub const fn bytes(&self) -> usize {
        self.bytes
    }

    /// Acquires served from resident resources.
    #[inline]
    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Acquires that found nothing to reuse.
    #[inline]
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }

    /// Whether the pool has been torn down.
    #[inline]
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn count_in(&self, state: ResourceState) -> usize {
        self.resources.iter().filter(|r| r.state() == state).count()
    }

    /// `(len - available) / len`, 0 for an empty pool.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn usage_ratio(&self) -> f64 {
        let len = self.len();
        if len == 0 {
            return 0.0;
        }
        (len - self.available_count()) as f64 / len as f64
    }

    /// Whether another resource of `size` bytes fits under both pool caps.
    #[must_use]
    pub fn has_room_for(&self, size: usize) -> bool {
        !self.closed
            && self.len() < self.config.max_size
            && self.bytes.saturating_add(size) <= self.config.memory_limit_bytes
    }

    /// Hands out an available resource chosen by the strategy.
    ///
    /// Counts a hit on success and a miss otherwise.
    pub fn check_out(&mut self, now: Timestamp) -> Option<(ResourceId, Payload)> {
        if self.closed {
            return None;
        }
        let picked = self
            .strategy
            .select(&self.resources, now)
            .and_then(|index| {
                let resource = &mut self.resources[index];
                resource
                    .check_out(now)
                    .map(|payload| (resource.id().clone(), payload))
            });
        if picked.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        picked
    }

    /// Reserves a slot for a construction. Returns `false` if it does not fit.
    pub fn reserve_slot(&mut self, size: usize) -> bool {
        if !self.has_room_for(size) {
            return false;
        }
        self.constructing += 1;
        self.bytes += size;
        true
    }

    /// Gives back a reservation whose construction failed or was abandoned.
    pub fn cancel_reservation(&mut self, size: usize) {
        debug_assert!(self.constructing > 0);
        self.constructing = self.constructing.saturating_sub(1);
        self.bytes = self.bytes.saturating_sub(size);
    }

    /// Turns a reservation into a resident resource.
    ///
    /// The resource keeps whatever state it arrives in (`Available` for
    /// preallocation, `InUse` when handed straight to a caller).
    pub fn fill_reservation(&mut self, resource: Resource) {
        debug_assert!(self.constructing > 0);
        self.constructing = self.constructing.saturating_sub(1);
        self.resources.push(resource);
    }

    fn position_in_use(&self, id: &ResourceId) -> Option<usize> {
        self.resources
            .iter()
            .position(|r| r.id() == id && r.state() == ResourceState::InUse)
    }

    /// Whether `id` names a resource this pool has checked out.
    #[must_use]
    pub fn owns_in_use(&self, id: &ResourceId) -> bool {
        self.position_in_use(id).is_some()
    }

    /// Decides whether a checked-out resource goes through the recycler.
    #[must_use]
    pub fn wants_recycle(&self, id: &ResourceId, now: Timestamp) -> bool {
        match self.config.recycle {
            RecycleMode::Always => true,
            RecycleMode::Never => false,
            RecycleMode::Strategy => self
                .position_in_use(id)
                .is_some_and(|i| self.strategy.should_recycle(&self.resources[i], now)),
        }
    }

    /// `InUse → Available`. Hands the payload back if `id` is not checked out here.
    pub fn check_in(
        &mut self,
        id: &ResourceId,
        payload: Payload,
        now: Timestamp,
    ) -> Result<(), Payload> {
        match self.position_in_use(id) {
            Some(index) => self.resources[index].check_in(payload, now),
            None => Err(payload),
        }
    }

    /// `InUse → Recycling`: removes the resource from residency for the recycler.
    ///
    /// Its slot and bytes stay accounted until [`Pool::reattach`] or
    /// [`Pool::forget_recycled`].
    pub fn detach_for_recycle(
        &mut self,
        id: &ResourceId,
        payload: Payload,
        now: Timestamp,
    ) -> Result<Resource, Payload> {
        let Some(index) = self.position_in_use(id) else {
            return Err(payload);
        };
        self.resources[index].begin_recycle(payload, now)?;
        self.recycling += 1;
        Ok(self.resources.swap_remove(index))
    }

    /// Takes a recycled resource back into residency.
    pub fn reattach(&mut self, resource: Resource) {
        debug_assert!(self.recycling > 0);
        self.recycling = self.recycling.saturating_sub(1);
        self.resources.push(resource);
    }

    /// Drops the accounting of a detached resource the recycler disposed.
    pub fn forget_recycled(&mut self, size: usize) {
        debug_assert!(self.recycling > 0);
        self.recycling = self.recycling.saturating_sub(1);
        self.bytes = self.bytes.saturating_sub(size);
    }

    /// Removes every `Available` resource idle for longer than `max_idle_time`.
    ///
    /// Resources idle for less than the threshold are never touched.
    pub fn evict_idle(&mut self, now: Timestamp) -> Vec<Retired> {
        let max_idle = self.config.max_idle_time();
        self.evict_where(|r| {
            r.state() == ResourceState::Available
                && now.saturating_since(r.last_used_at()) > max_idle
        })
    }

    /// Evicts the `count` lowest-priority available resources.
    pub fn evict_least_valuable(&mut self, count: usize, now: Timestamp) -> Vec<Retired> {
        if count == 0 {
            return Vec::new();
        }
        let mut candidates: Vec<(f64, ResourceId)> = self
            .resources
            .iter()
            .filter(|r| r.state() == ResourceState::Available)
            .map(|r| (self.strategy.priority(r, now), r.id().clone()))
            .collect();
        candidates.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
        });
        candidates.truncate(count);
        let victims: Vec<ResourceId> = candidates.into_iter().map(|(_, id)| id).collect();
        self.evict_where(|r| victims.contains(r.id()))
    }

    fn evict_where<F: Fn(&Resource) -> bool>(&mut self, predicate: F) -> Vec<Retired> {
        let mut evicted = Vec::new();
        let mut kept = Vec::with_capacity(self.resources.len());
        for resource in self.resources.drain(..) {
            if !predicate(&resource) {
                kept.push(resource);
                continue;
            }
            match resource.retire() {
                Ok(retired) => {
                    self.bytes = self.bytes.saturating_sub(retired.resource.size_bytes());
                    evicted.push(retired);
                }
                Err(resource) => kept.push(resource),
            }
        }
        self.resources = kept;
        evicted
    }

    /// Refreshes priorities and sorts storage: available resources first,
    /// by descending usage count, then everything else.
    pub fn defragment(&mut self, now: Timestamp) {
        for resource in &mut self.resources {
            let priority = self.strategy.priority(resource, now);
            resource.set_priority(priority);
        }
        self.resources.sort_by(|a, b| {
            let a_busy = a.state() != ResourceState::Available;
            let b_busy = b.state() != ResourceState::Available;
            a_busy
                .cmp(&b_busy)
                .then_with(|| b.usage_count().cmp(&a.usage_count()))
                .then_with(|| a.id().cmp(b.id()))
        });
    }

    /// Whether the pool's cleanup interval has elapsed since its last pass.
    #[must_use]
    pub fn maintenance_due(&self, now: Timestamp) -> bool {
        self.last_maintained
            .map_or(true, |last| now.saturating_since(last) >= self.config.cleanup_interval())
    }

    /// Records a completed maintenance pass.
    pub fn mark_maintained(&mut self, now: Timestamp) {
        self.last_maintained = Some(now);
    }

    /// Closes the pool and disposes every resident resource.
    ///
    /// Returns the disposed resources so their cleanup hooks can run outside
    /// the pool lock. Resources in the recycler are released by the recycler;
    /// constructions in flight notice the closed pool and release themselves.
    pub fn close(&mut self) -> Vec<Retired> {
        self.closed = true;
        self.bytes = self.bytes.saturating_sub(
            self.resources.iter().map(Resource::size_bytes).sum::<usize>(),
        );
        self.resources.drain(..).map(Resource::force_retire).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{IdSource, SequentialIds};

    fn config(initial: usize, max: usize) -> PoolConfiguration {
        PoolConfiguration {
            initial_size: initial,
            max_size: max,
            max_idle_time_ms: 10_000,
            ..PoolConfiguration::new("test", ResourceKind::Buffer)
        }
    }

    fn fill(pool: &mut Pool, ids: &SequentialIds, count: usize, now: Timestamp) {
        for _ in 0..count {
            assert!(pool.reserve_slot(64));
            pool.fill_reservation(Resource::new(
                ids.next_id(),
                ResourceKind::Buffer,
                64,
                Payload::empty(ResourceKind::Buffer),
                now,
            ));
        }
    }

    #[test]
    fn test_pool_checkout_checkin() {
        let ids = SequentialIds::default();
        let mut pool = Pool::new(config(1, 4)).unwrap();
        fill(&mut pool, &ids, 1, Timestamp(0));

        let (id, payload) = pool.check_out(Timestamp(5)).unwrap();
        assert_eq!(pool.in_use_count(), 1);
        assert!(pool.check_out(Timestamp(6)).is_none());
        assert_eq!(pool.hits(), 1);
        assert_eq!(pool.misses(), 1);

        pool.check_in(&id, payload, Timestamp(7)).unwrap();
        assert_eq!(pool.available_count(), 1);
    }

    #[test]
    fn test_pool_full() {
        let ids = SequentialIds::default();
        let mut pool = Pool::new(config(0, 2)).unwrap();
        fill(&mut pool, &ids, 2, Timestamp(0));
        assert!(!pool.reserve_slot(64));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_reservations_count_toward_capacity() {
        let mut pool = Pool::new(config(0, 1)).unwrap();
        assert!(pool.reserve_slot(64));
        assert!(!pool.has_room_for(64));
        pool.cancel_reservation(64);
        assert!(pool.is_empty());
        assert_eq!(pool.bytes(), 0);
    }

    #[test]
    fn test_byte_cap() {
        let mut pool = Pool::new(PoolConfiguration {
            memory_limit_bytes: 100,
            ..config(0, 10)
        })
        .unwrap();
        assert!(pool.reserve_slot(64));
        assert!(!pool.reserve_slot(64));
    }

    #[test]
    fn test_detach_keeps_slot() {
        let ids = SequentialIds::default();
        let mut pool = Pool::new(config(0, 1)).unwrap();
        fill(&mut pool, &ids, 1, Timestamp(0));
        let (id, payload) = pool.check_out(Timestamp(1)).unwrap();
        let detached = pool.detach_for_recycle(&id, payload, Timestamp(2)).unwrap();
        assert_eq!(detached.state(), ResourceState::Recycling);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.recycling_count(), 1);
        assert!(!pool.has_room_for(64));
        pool.forget_recycled(detached.size_bytes());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_release_of_unknown_id_is_rejected() {
        let mut pool = Pool::new(config(0, 1)).unwrap();
        let payload = Payload::empty(ResourceKind::Buffer);
        assert!(pool
            .check_in(&ResourceId::new("nope"), payload, Timestamp(0))
            .is_err());
    }

    #[test]
    fn test_evict_idle_respects_threshold() {
        let ids = SequentialIds::default();
        let mut pool = Pool::new(config(0, 4)).unwrap();
        fill(&mut pool, &ids, 2, Timestamp(0));
        let (id, payload) = pool.check_out(Timestamp(5_000)).unwrap();
        pool.check_in(&id, payload, Timestamp(5_000)).unwrap();

        // One resource idle 10_001 ms, the other 5_001 ms.
        let evicted = pool.evict_idle(Timestamp(10_001));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].resource.state(), ResourceState::Disposed);
        assert!(evicted[0].payload.is_some());
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.bytes(), 64);
        assert_eq!(pool.resources()[0].id(), &id);
    }

    #[test]
    fn test_defragment_orders_available_by_usage() {
        let ids = SequentialIds::default();
        let mut pool = Pool::new(PoolConfiguration {
            strategy: crate::strategy::StrategyKind::Frequency,
            ..config(0, 4)
        })
        .unwrap();
        fill(&mut pool, &ids, 3, Timestamp(0));
        // Use the least-used resource repeatedly: frequency spreads the wear.
        for t in 1..=5 {
            let (id, payload) = pool.check_out(Timestamp(t)).unwrap();
            pool.check_in(&id, payload, Timestamp(t)).unwrap();
        }
        let (busy, _payload) = pool.check_out(Timestamp(10)).unwrap();
        pool.defragment(Timestamp(10));

        let states: Vec<_> = pool.resources().iter().map(Resource::state).collect();
        assert_eq!(states.last(), Some(&ResourceState::InUse));
        assert_eq!(pool.resources().last().unwrap().id(), &busy);
        let available = &pool.resources()[..2];
        assert!(available[0].usage_count() >= available[1].usage_count());
    }

    #[test]
    fn test_close_disposes_everything() {
        let ids = SequentialIds::default();
        let mut pool = Pool::new(config(0, 4)).unwrap();
        fill(&mut pool, &ids, 3, Timestamp(0));
        let _ = pool.check_out(Timestamp(1)).unwrap();
        let drained = pool.close();
        assert_eq!(drained.len(), 3);
        assert!(drained
            .iter()
            .all(|r| r.resource.state() == ResourceState::Disposed));
        assert!(pool.is_closed());
        assert!(pool.check_out(Timestamp(2)).is_none());
        assert_eq!(pool.bytes(), 0);
    }

    #[test]
    fn test_recreated_pool_has_new_serial() {
        let first = Pool::new(config(0, 2)).unwrap();
        let second = Pool::new(config(0, 2)).unwrap();
        assert_eq!(first.config().name, second.config().name);
        assert_ne!(first.serial(), second.serial());
    }
}
