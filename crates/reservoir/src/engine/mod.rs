//! # Pooling Engine
//!
//! The public face of RESERVOIR. Owns every pool, the shared memory budget, the
//! recycler, the usage analyzer and the maintenance thread.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       POOLING ENGINE                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  RwLock<name → Arc<Mutex<Pool>>>                             │
//! │       │ acquire: select ─ hit ──────────────▶ handle         │
//! │       │          └ miss: reserve slot ─▶ budget ─▶ factory   │
//! │       │ release: check in ─or─ detach ─▶ Recycler queue      │
//! │       ▼                                                      │
//! │  MemoryManager (one lock)   UsagePatternAnalyzer (one lock)  │
//! │                                                              │
//! │  maintenance thread: drain recycler ─▶ optimize due pools    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//!
//! Pool map → pool → (recycler queue | budget). The analyzer is only touched
//! with no pool lock held. Factories and cleanup hooks never run while a pool
//! lock is held.

mod handle;
mod maintenance;
mod optimize;
mod status;

pub use handle::ResourceHandle;
pub use optimize::{
    growth_target, shrink_target, GrowthRecommendation, OptimizationReport, PoolOptimization,
    GROWTH_USAGE_RATIO,
};
pub use status::{hit_ratio, PoolStatus, StatusSnapshot};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use reservoir_core::analyzer::DEFAULT_TREND_WINDOW;
use reservoir_core::{
    Clock, DefaultFactory, IdSource, MemoryConfig, MemoryManager, Payload, Pool,
    PoolConfiguration, PoolError, PoolResult, Poolable, Prediction, RecycleResult, Recycler,
    ResetStrategy, Resource, ResourceFactory, ResourceKind, Retired, SequentialIds, SystemClock,
    Timestamp, UsagePatternAnalyzer,
};
use serde::Serialize;

use crate::config::EngineConfig;
use maintenance::MaintenanceWorker;

/// Default maintenance period.
pub const DEFAULT_MAINTENANCE_INTERVAL: Duration = Duration::from_secs(1);

type SharedPool = Arc<Mutex<Pool>>;

/// Result of one recycler drain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DrainSummary {
    /// Resources reset and returned to their pool.
    pub recycled: usize,
    /// Resources that failed reset, or whose pool is gone.
    pub disposed: usize,
}

/// Result of one maintenance cycle.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MaintenanceReport {
    /// Resources returned to service by the recycler.
    pub recycled: usize,
    /// Resources disposed by the recycler.
    pub disposed: usize,
    /// Pools whose cleanup interval had elapsed.
    pub optimization: OptimizationReport,
}

/// State shared with the maintenance thread.
pub(crate) struct Shared {
    pools: RwLock<HashMap<String, SharedPool>>,
    memory: MemoryManager,
    recycler: Recycler,
    analyzer: UsagePatternAnalyzer,
    factories: HashMap<ResourceKind, Arc<dyn ResourceFactory>>,
    default_factory: Arc<dyn ResourceFactory>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
    shutting_down: AtomicBool,
}

impl Shared {
    fn factory(&self, kind: ResourceKind) -> &dyn ResourceFactory {
        match self.factories.get(&kind) {
            Some(factory) => &**factory,
            None => &*self.default_factory,
        }
    }

    fn estimate_size(&self, kind: ResourceKind) -> usize {
        self.factory(kind).estimate_size(kind).max(1)
    }

    pub(crate) fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    fn pool(&self, name: &str) -> PoolResult<SharedPool> {
        self.pools
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| PoolError::UnknownPool(name.to_string()))
    }

    fn sorted_pools(&self) -> Vec<(String, SharedPool)> {
        let mut pools: Vec<(String, SharedPool)> = self
            .pools
            .read()
            .iter()
            .map(|(name, pool)| (name.clone(), Arc::clone(pool)))
            .collect();
        pools.sort_by(|a, b| a.0.cmp(&b.0));
        pools
    }

    /// Error for a pool that vanished or closed under us.
    fn gone(&self, name: &str) -> PoolError {
        if self.is_shutting_down() {
            PoolError::ShuttingDown
        } else {
            PoolError::UnknownPool(name.to_string())
        }
    }

    // ---------------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------------

    /// Reserves a pool slot and budget bytes. Nothing is reserved on `false`.
    fn reserve(&self, pool: &Mutex<Pool>, size: usize) -> bool {
        if !pool.lock().reserve_slot(size) {
            return false;
        }
        if !self.memory.try_reserve(size) {
            pool.lock().cancel_reservation(size);
            return false;
        }
        true
    }

    fn abandon(&self, pool: &Mutex<Pool>, size: usize) {
        pool.lock().cancel_reservation(size);
        self.memory.record_deallocation(size);
    }

    fn construct(&self, kind: ResourceKind, size: usize, now: Timestamp) -> PoolResult<Resource> {
        let payload = self
            .factory(kind)
            .construct(kind)
            .map_err(|err| PoolError::ConstructionFailed {
                kind,
                reason: err.to_string(),
            })?;
        if payload.kind() != kind {
            return Err(PoolError::ConstructionFailed {
                kind,
                reason: format!("factory returned a {} payload", payload.kind()),
            });
        }
        Ok(Resource::new(self.ids.next_id(), kind, size, payload, now))
    }

    /// Moves a constructed resource into its reserved slot. If the pool closed
    /// meanwhile, the slot is released and the resource handed back; its budget
    /// bytes are still the caller's to return.
    fn install(
        &self,
        name: &str,
        pool: &Mutex<Pool>,
        resource: Resource,
    ) -> Result<(), (PoolError, Resource)> {
        let mut guard = pool.lock();
        if guard.is_closed() || self.is_shutting_down() {
            guard.cancel_reservation(resource.size_bytes());
            return Err((self.gone(name), resource));
        }
        guard.fill_reservation(resource);
        Ok(())
    }

    fn run_cleanup(&self, pool: &str, kind: ResourceKind, payload: &mut Payload) {
        if let Err(err) = self.factory(kind).cleanup(payload) {
            tracing::warn!("cleanup hook failed for {} resource in {}: {}", kind, pool, err);
        }
    }

    /// Releases the budget for disposed resources and runs their cleanup hooks.
    fn dispose_all(&self, pool: &str, retired: Vec<Retired>) {
        for Retired {
            resource,
            mut payload,
        } in retired
        {
            self.memory.record_deallocation(resource.size_bytes());
            if let Some(payload) = payload.as_mut() {
                self.run_cleanup(pool, resource.kind(), payload);
            }
        }
    }

    /// Disposes a resource that never made it into (or back into) a pool.
    fn discard(&self, pool: &str, resource: Resource) {
        match resource.retire() {
            Ok(retired) => self.dispose_all(pool, vec![retired]),
            Err(resource) => self.memory.record_deallocation(resource.size_bytes()),
        }
    }

    fn preallocate(&self, name: &str, pool: &Mutex<Pool>, kind: ResourceKind, target: usize) {
        let size = self.estimate_size(kind);
        let mut built = 0;
        while built < target {
            if !self.reserve(pool, size) {
                break;
            }
            let resource = match self.construct(kind, size, self.clock.now()) {
                Ok(resource) => resource,
                Err(err) => {
                    self.abandon(pool, size);
                    tracing::warn!("preallocation of {} stopped: {}", name, err);
                    break;
                }
            };
            if let Err((_, resource)) = self.install(name, pool, resource) {
                self.discard(name, resource);
                break;
            }
            built += 1;
        }
        if built < target {
            tracing::warn!("pool {} preallocated {}/{} resources", name, built, target);
        }
    }

    // ---------------------------------------------------------------------
    // Operations
    // ---------------------------------------------------------------------

    fn create_pool(&self, name: &str, mut config: PoolConfiguration) -> PoolResult<()> {
        if self.is_shutting_down() {
            return Err(PoolError::ShuttingDown);
        }
        config.name = name.to_string();
        let kind = config.kind;
        let preallocate = config.preallocate.then_some(config.initial_size);
        let pool = Arc::new(Mutex::new(Pool::new(config)?));

        {
            let mut pools = self.pools.write();
            if pools.contains_key(name) {
                return Err(PoolError::PoolAlreadyExists(name.to_string()));
            }
            pools.insert(name.to_string(), Arc::clone(&pool));
        }
        tracing::info!("pool {} created ({})", name, kind);

        if let Some(target) = preallocate {
            self.preallocate(name, &pool, kind, target);
        }
        Ok(())
    }

    fn acquire(&self, name: &str, kind: Option<ResourceKind>) -> PoolResult<Option<ResourceHandle>> {
        if self.is_shutting_down() {
            return Err(PoolError::ShuttingDown);
        }
        let pool = self.pool(name)?;
        let now = self.clock.now();

        let (kind, hit) = {
            let mut guard = pool.lock();
            if guard.is_closed() {
                return Err(self.gone(name));
            }
            let pool_kind = guard.kind();
            if let Some(requested) = kind {
                if requested != pool_kind {
                    return Err(PoolError::KindMismatch {
                        pool: name.to_string(),
                        expected: pool_kind,
                        requested,
                    });
                }
            }
            (pool_kind, guard.check_out(now))
        };

        let size = self.estimate_size(kind);
        self.analyzer.record(kind, size, now, self.clock.hour_of_day());
        if let Some((id, payload)) = hit {
            return Ok(Some(ResourceHandle {
                pool: name.to_string(),
                id,
                payload,
            }));
        }

        if !self.reserve(&pool, size) {
            return Ok(None);
        }
        let mut resource = match self.construct(kind, size, now) {
            Ok(resource) => resource,
            Err(err) => {
                self.abandon(&pool, size);
                tracing::warn!("construction for {} failed: {}", name, err);
                return Err(err);
            }
        };
        let Some(payload) = resource.check_out(now) else {
            self.abandon(&pool, size);
            return Err(PoolError::ConstructionFailed {
                kind,
                reason: "fresh resource could not be checked out".to_string(),
            });
        };
        let id = resource.id().clone();
        match self.install(name, &pool, resource) {
            Ok(()) => Ok(Some(ResourceHandle {
                pool: name.to_string(),
                id,
                payload,
            })),
            Err((err, resource)) => {
                self.memory.record_deallocation(resource.size_bytes());
                let mut payload = payload;
                self.run_cleanup(name, kind, &mut payload);
                Err(err)
            }
        }
    }

    fn release(&self, name: &str, handle: ResourceHandle) -> PoolResult<()> {
        let pool = match self.pool(name) {
            Ok(pool) => pool,
            Err(err) if self.is_shutting_down() => {
                tracing::debug!("release into {} after shutdown: {}", name, err);
                return Err(PoolError::ShuttingDown);
            }
            Err(err) => return Err(err),
        };
        let not_owned = || PoolError::ResourceNotOwned {
            pool: name.to_string(),
            resource: handle.id.to_string(),
        };
        if handle.pool != name {
            return Err(not_owned());
        }

        let now = self.clock.now();
        let mut guard = pool.lock();
        if guard.is_closed() {
            return Err(self.gone(name));
        }
        if !guard.owns_in_use(&handle.id) {
            return Err(not_owned());
        }
        let error = not_owned();
        let ResourceHandle { id, payload, .. } = handle;

        if guard.wants_recycle(&id, now) {
            let resource = guard
                .detach_for_recycle(&id, payload, now)
                .map_err(|_| error)?;
            // Queued under the pool lock so teardown cannot miss it.
            self.recycler.enqueue(&guard, resource);
            Ok(())
        } else {
            guard.check_in(&id, payload, now).map_err(|_| error)
        }
    }

    pub(crate) fn drain_recycler(&self) -> DrainSummary {
        let mut summary = DrainSummary::default();
        for outcome in self.recycler.drain() {
            let size = outcome.resource.size_bytes();
            let pool = self.pools.read().get(&outcome.pool).cloned();
            // Only the exact pool instance the resource left may take it back;
            // a pool recreated under the same name never counted it.
            let owner = pool
                .as_ref()
                .map(|pool| pool.lock())
                .filter(|guard| guard.serial() == outcome.pool_serial && !guard.is_closed());

            match (owner, outcome.result) {
                (Some(mut guard), RecycleResult::Recycled) => {
                    guard.reattach(outcome.resource);
                    summary.recycled += 1;
                }
                (Some(mut guard), RecycleResult::Disposed(_)) => {
                    guard.forget_recycled(size);
                    drop(guard);
                    self.memory.record_deallocation(size);
                    summary.disposed += 1;
                }
                (None, RecycleResult::Disposed(_)) => {
                    self.memory.record_deallocation(size);
                    summary.disposed += 1;
                }
                // Recycled for a pool that no longer exists.
                (None, RecycleResult::Recycled) => {
                    self.discard(&outcome.pool, outcome.resource);
                    summary.disposed += 1;
                }
            };
        }
        summary
    }

    fn optimize_where(&self, due_only: bool) -> OptimizationReport {
        let now = self.clock.now();
        let hour = self.clock.hour_of_day();
        let mut report = OptimizationReport::default();

        for (name, pool) in self.sorted_pools() {
            let (kind, due) = {
                let guard = pool.lock();
                (guard.kind(), !guard.is_closed() && guard.maintenance_due(now))
            };
            if due_only && !due {
                continue;
            }
            let prediction = self.analyzer.predict(kind, now, hour);
            let (pass, growth, evicted) = optimize::optimize_pool(&name, &pool, &prediction, now);

            if !evicted.is_empty() {
                tracing::debug!(
                    "pool {}: evicted {} idle, shrunk {}",
                    name,
                    pass.evicted_idle,
                    pass.shrunk
                );
            }
            self.dispose_all(&name, evicted);
            if let Some(growth) = growth {
                tracing::info!(
                    "pool {} is busy: recommend {} -> {} (confidence {:.2})",
                    name,
                    growth.current_size,
                    growth.target_size,
                    growth.confidence
                );
                report.growth.push(growth);
            }
            report.pools.push(pass);
        }
        report
    }

    pub(crate) fn maintain(&self) -> MaintenanceReport {
        let drained = self.drain_recycler();
        MaintenanceReport {
            recycled: drained.recycled,
            disposed: drained.disposed,
            optimization: self.optimize_where(true),
        }
    }

    fn status(&self) -> StatusSnapshot {
        let pools = self
            .sorted_pools()
            .iter()
            .map(|(name, pool)| PoolStatus::capture(name, &pool.lock()))
            .collect();
        StatusSnapshot {
            taken_at_ms: self.clock.now().as_millis(),
            shutting_down: self.is_shutting_down(),
            memory: self.memory.metrics(),
            recycler: self.recycler.stats(),
            pools,
        }
    }

    fn destroy_pool(&self, name: &str) -> PoolResult<()> {
        let pool = self
            .pools
            .write()
            .remove(name)
            .ok_or_else(|| PoolError::UnknownPool(name.to_string()))?;
        let retired = pool.lock().close();
        let count = retired.len();
        self.dispose_all(name, retired);
        tracing::info!("pool {} destroyed ({} resources disposed)", name, count);
        Ok(())
    }

    fn close_everything(&self) {
        let pools: Vec<(String, SharedPool)> = self.pools.write().drain().collect();
        for (name, pool) in pools {
            let retired = pool.lock().close();
            self.dispose_all(&name, retired);
        }
        for (pool, retired) in self.recycler.clear() {
            self.dispose_all(&pool, vec![retired]);
        }
    }
}

/// Configures and builds a [`PoolingEngine`].
pub struct EngineBuilder {
    memory: MemoryConfig,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
    default_factory: Arc<dyn ResourceFactory>,
    factories: HashMap<ResourceKind, Arc<dyn ResourceFactory>>,
    reset_strategies: Vec<(ResourceKind, Arc<dyn ResetStrategy>)>,
    maintenance_interval: Option<Duration>,
    analyzer_window: Duration,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    /// System clock, sequential ids, default factory, 1 s maintenance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: MemoryConfig::default(),
            clock: Arc::new(SystemClock::new()),
            ids: Arc::new(SequentialIds::default()),
            default_factory: Arc::new(DefaultFactory::default()),
            factories: HashMap::new(),
            reset_strategies: Vec::new(),
            maintenance_interval: Some(DEFAULT_MAINTENANCE_INTERVAL),
            analyzer_window: DEFAULT_TREND_WINDOW,
        }
    }

    /// Memory budget settings.
    #[must_use]
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }

    /// Shorthand for a default budget with this limit.
    #[must_use]
    pub fn memory_limit(mut self, limit_bytes: usize) -> Self {
        self.memory.limit_bytes = limit_bytes;
        self
    }

    /// Time source.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Resource id source.
    #[must_use]
    pub fn ids(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    /// Factory used for kinds without a dedicated one.
    #[must_use]
    pub fn default_factory(mut self, factory: Arc<dyn ResourceFactory>) -> Self {
        self.default_factory = factory;
        self
    }

    /// Dedicated factory for one kind.
    #[must_use]
    pub fn factory(mut self, kind: ResourceKind, factory: Arc<dyn ResourceFactory>) -> Self {
        self.factories.insert(kind, factory);
        self
    }

    /// Reset strategy for one kind.
    #[must_use]
    pub fn reset_strategy(mut self, kind: ResourceKind, strategy: Arc<dyn ResetStrategy>) -> Self {
        self.reset_strategies.push((kind, strategy));
        self
    }

    /// Background maintenance period.
    #[must_use]
    pub fn maintenance_interval(mut self, interval: Duration) -> Self {
        self.maintenance_interval = Some(interval);
        self
    }

    /// No background thread; call [`PoolingEngine::maintain`] yourself.
    #[must_use]
    pub fn without_maintenance(mut self) -> Self {
        self.maintenance_interval = None;
        self
    }

    /// Analyzer recent-demand window.
    #[must_use]
    pub fn analyzer_window(mut self, window: Duration) -> Self {
        self.analyzer_window = window;
        self
    }

    /// Builds the engine and starts maintenance.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] for a bad budget and
    /// [`PoolError::Config`] if the maintenance thread cannot be spawned.
    pub fn build(self) -> PoolResult<PoolingEngine> {
        self.memory.validate()?;
        let recycler = self
            .reset_strategies
            .into_iter()
            .fold(Recycler::new(), |recycler, (kind, strategy)| {
                recycler.with_strategy(kind, strategy)
            });
        let shared = Arc::new(Shared {
            pools: RwLock::new(HashMap::new()),
            memory: MemoryManager::with_clock(self.memory, Arc::clone(&self.clock)),
            recycler,
            analyzer: UsagePatternAnalyzer::new(self.analyzer_window),
            factories: self.factories,
            default_factory: self.default_factory,
            clock: self.clock,
            ids: self.ids,
            shutting_down: AtomicBool::new(false),
        });

        let worker = match self.maintenance_interval {
            Some(interval) if !interval.is_zero() => Some(
                MaintenanceWorker::spawn(Arc::downgrade(&shared), interval).map_err(|err| {
                    PoolError::Config(format!("cannot start maintenance thread: {err}"))
                })?,
            ),
            _ => None,
        };

        Ok(PoolingEngine {
            shared,
            worker: Mutex::new(worker),
        })
    }
}

/// Bounded, budgeted resource pools with background maintenance.
///
/// ```rust,ignore
/// let engine = PoolingEngine::builder().memory_limit(64 << 20).build()?;
/// engine.create_pool("sparks", PoolConfiguration::new("sparks", ResourceKind::Particle))?;
///
/// if let Some(mut handle) = engine.acquire("sparks", None)? {
///     handle.as_particle_mut().map(|p| p.color = [1.0; 4]);
///     engine.release("sparks", handle)?;
/// }
/// ```
pub struct PoolingEngine {
    shared: Arc<Shared>,
    worker: Mutex<Option<MaintenanceWorker>>,
}

impl std::fmt::Debug for PoolingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolingEngine")
            .field("pools", &self.pool_names())
            .field("shutting_down", &self.shared.is_shutting_down())
            .finish_non_exhaustive()
    }
}

impl PoolingEngine {
    /// Starts configuring an engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Engine with default collaborators and the given budget.
    ///
    /// # Errors
    ///
    /// As [`EngineBuilder::build`].
    pub fn new(memory: MemoryConfig) -> PoolResult<Self> {
        Self::builder().memory(memory).build()
    }

    /// Builds an engine from a loaded configuration and creates its pools.
    ///
    /// # Errors
    ///
    /// As [`EngineBuilder::build`] and [`PoolingEngine::create_pool`].
    pub fn from_config(config: &EngineConfig) -> PoolResult<Self> {
        Self::configured(config, EngineBuilder::new())
    }

    /// Like [`PoolingEngine::from_config`], starting from a prepared builder
    /// (custom clock, factories, ...). Config values override the builder's
    /// budget, default factory and intervals.
    ///
    /// # Errors
    ///
    /// As [`PoolingEngine::from_config`].
    pub fn configured(config: &EngineConfig, builder: EngineBuilder) -> PoolResult<Self> {
        config.validate()?;
        let mut builder = builder
            .memory(config.memory.clone())
            .default_factory(Arc::new(DefaultFactory::new(config.factory)))
            .analyzer_window(config.analyzer_window());
        builder = match config.maintenance_interval() {
            Some(interval) => builder.maintenance_interval(interval),
            None => builder.without_maintenance(),
        };
        let engine = builder.build()?;
        for pool in &config.pools {
            engine.create_pool(&pool.name, pool.clone())?;
        }
        Ok(engine)
    }

    /// Registers a pool. `name` overrides `config.name`.
    ///
    /// With `preallocate`, up to `initial_size` resources are built, each
    /// gated by the budget; a partial preallocation is logged, not an error.
    ///
    /// # Errors
    ///
    /// [`PoolError::PoolAlreadyExists`], [`PoolError::InvalidConfiguration`] or
    /// [`PoolError::ShuttingDown`].
    pub fn create_pool(&self, name: &str, config: PoolConfiguration) -> PoolResult<()> {
        self.shared.create_pool(name, config)
    }

    /// Hands out a resource from `pool`, constructing one on a miss.
    ///
    /// Returns `Ok(None)` when the pool is full, its byte cap is reached, or
    /// the budget refuses admission.
    ///
    /// # Errors
    ///
    /// [`PoolError::UnknownPool`], [`PoolError::KindMismatch`],
    /// [`PoolError::ConstructionFailed`] or [`PoolError::ShuttingDown`].
    pub fn acquire(
        &self,
        pool: &str,
        kind: Option<ResourceKind>,
    ) -> PoolResult<Option<ResourceHandle>> {
        self.shared.acquire(pool, kind)
    }

    /// Returns a handle to `pool`. Never blocks on cleanup: resources that need
    /// a reset are queued for the next recycler drain.
    ///
    /// # Errors
    ///
    /// [`PoolError::UnknownPool`], [`PoolError::ResourceNotOwned`] (other pool,
    /// unknown id, not checked out) or [`PoolError::ShuttingDown`]. The handle
    /// is consumed either way.
    pub fn release(&self, pool: &str, handle: ResourceHandle) -> PoolResult<()> {
        self.shared.release(pool, handle)
    }

    /// Optimizes every pool now, regardless of cleanup intervals.
    pub fn optimize(&self) -> OptimizationReport {
        self.shared.optimize_where(false)
    }

    /// One maintenance cycle: drain the recycler, then optimize each pool whose
    /// cleanup interval has elapsed.
    pub fn maintain(&self) -> MaintenanceReport {
        self.shared.maintain()
    }

    /// Resets everything in the recycler queue and returns it to service.
    pub fn drain_recycler(&self) -> DrainSummary {
        self.shared.drain_recycler()
    }

    /// Point-in-time snapshot of every pool and the budget.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        self.shared.status()
    }

    /// Demand prediction for a kind, as the optimizer sees it.
    #[must_use]
    pub fn predict(&self, kind: ResourceKind) -> Prediction {
        let clock = &self.shared.clock;
        self.shared
            .analyzer
            .predict(kind, clock.now(), clock.hour_of_day())
    }

    /// Registered pool names, sorted.
    #[must_use]
    pub fn pool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.shared.pools.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Tears down one pool and releases its memory.
    ///
    /// # Errors
    ///
    /// [`PoolError::UnknownPool`].
    pub fn destroy_pool(&self, name: &str) -> PoolResult<()> {
        self.shared.destroy_pool(name)
    }

    /// Whether [`PoolingEngine::destroy`] has run.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.shared.is_shutting_down()
    }

    /// Stops maintenance and disposes every resource. Idempotent.
    pub fn destroy(&self) {
        if self.shared.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(mut worker) = self.worker.lock().take() {
            worker.stop();
        }
        self.shared.close_everything();
        tracing::info!(
            "pooling engine destroyed ({} bytes still accounted)",
            self.shared.memory.current_usage()
        );
    }
}

impl Drop for PoolingEngine {
    fn drop(&mut self) {
        self.destroy();
    }
}
