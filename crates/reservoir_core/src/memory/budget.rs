//! Global memory budget with admission control.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use super::window::SampleWindow;
use crate::analyzer::TimeSlot;
use crate::clock::{Clock, SystemClock};
use crate::config::MemoryConfig;

/// Point-in-time view of the budget.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MemoryMetrics {
    /// Bytes currently accounted.
    pub allocated: usize,
    /// `limit - allocated`, saturating.
    pub available: usize,
    /// Configured limit.
    pub limit: usize,
    /// Highest `allocated` ever observed.
    pub peak: usize,
    /// Highest `allocated` observed in the current time slot.
    pub slot_peak: usize,
    /// `allocated / limit`.
    pub utilization: f64,
    /// Fraction of admission requests that were granted (1.0 before any request).
    pub efficiency: f64,
    /// Admission requests granted.
    pub granted: u64,
    /// Admission requests refused.
    pub denied: u64,
    /// Current trend factor.
    pub trend: f64,
    /// `max(slot_peak, allocated) * trend`.
    pub predicted_peak: f64,
}

#[derive(Debug)]
struct BudgetState {
    limit: usize,
    current: usize,
    peak: usize,
    slot_peaks: [usize; TimeSlot::ALL.len()],
    window: SampleWindow,
    granted: u64,
    denied: u64,
}

impl BudgetState {
    fn slot_peak(&self, slot: TimeSlot) -> usize {
        self.slot_peaks[slot.index()]
    }
}

/// Process-wide memory budget shared by all pools.
///
/// All counters live behind one dedicated lock, so the check and the record in
/// [`MemoryManager::try_reserve`] are a single atomic step. The clock supplies
/// the time slot whose historical peak feeds the prediction.
pub struct MemoryManager {
    config: MemoryConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<BudgetState>,
}

impl std::fmt::Debug for MemoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryManager")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl MemoryManager {
    /// Creates a budget on the system clock.
    #[must_use]
    pub fn new(config: MemoryConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Creates a budget whose time slots follow `clock`.
    #[must_use]
    pub fn with_clock(config: MemoryConfig, clock: Arc<dyn Clock>) -> Self {
        let state = BudgetState {
            limit: config.limit_bytes,
            current: 0,
            peak: 0,
            slot_peaks: [0; TimeSlot::ALL.len()],
            window: SampleWindow::new(config.window_size.max(2)),
            granted: 0,
            denied: 0,
        };
        Self {
            config,
            clock,
            state: Mutex::new(state),
        }
    }

    /// Configured limit.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.state.lock().limit
    }

    /// Replaces the limit. Already-accounted bytes stay accounted.
    pub fn set_limit(&self, limit: usize) {
        self.state.lock().limit = limit;
    }

    /// Bytes currently accounted.
    #[must_use]
    pub fn current_usage(&self) -> usize {
        self.state.lock().current
    }

    fn slot(&self) -> TimeSlot {
        TimeSlot::from_hour(self.clock.hour_of_day())
    }

    fn trend(&self, state: &BudgetState) -> f64 {
        state.window.trend(
            self.config.min_trend_samples,
            self.config.trend_min,
            self.config.trend_max,
        )
    }

    #[allow(clippy::cast_precision_loss)]
    fn predicted_peak(&self, state: &BudgetState, slot: TimeSlot) -> f64 {
        state.slot_peak(slot).max(state.current) as f64 * self.trend(state)
    }

    #[allow(clippy::cast_precision_loss)]
    fn admits(&self, state: &BudgetState, size: usize, slot: TimeSlot) -> bool {
        let limit = state.limit as f64;
        let after = state.current.saturating_add(size) as f64;
        let headroom_ok = after < limit * self.config.headroom_ratio;
        let peak_ok = self.predicted_peak(state, slot) + (size as f64) < limit;
        headroom_ok && peak_ok
    }

    /// Whether `size` more bytes would be admitted right now.
    ///
    /// Read-only: the granted/denied counters only track [`MemoryManager::try_reserve`].
    #[must_use]
    pub fn can_allocate(&self, size: usize) -> bool {
        let slot = self.slot();
        let state = self.state.lock();
        self.admits(&state, size, slot)
    }

    /// Records an allocation. Callers are expected to have asked first.
    pub fn record_allocation(&self, size: usize) {
        let slot = self.slot();
        let mut state = self.state.lock();
        Self::apply_allocation(&mut state, size, slot);
    }

    #[allow(clippy::cast_precision_loss)]
    fn apply_allocation(state: &mut BudgetState, size: usize, slot: TimeSlot) {
        state.current = state.current.saturating_add(size);
        state.peak = state.peak.max(state.current);
        let slot_peak = &mut state.slot_peaks[slot.index()];
        *slot_peak = (*slot_peak).max(state.current);
        state.window.push(size as f64);
    }

    /// Admission check and allocation record in one step.
    ///
    /// Returns `false` (recording nothing) when admission is refused.
    pub fn try_reserve(&self, size: usize) -> bool {
        let slot = self.slot();
        let mut state = self.state.lock();
        let granted = self.admits(&state, size, slot);
        if granted {
            state.granted += 1;
            Self::apply_allocation(&mut state, size, slot);
        } else {
            state.denied += 1;
        }
        granted
    }

    /// Returns bytes to the budget. Never fails; clamps at zero.
    pub fn record_deallocation(&self, size: usize) {
        let mut state = self.state.lock();
        if size > state.current {
            tracing::debug!(
                "deallocation of {} bytes exceeds accounted {}, clamping",
                size,
                state.current
            );
        }
        state.current = state.current.saturating_sub(size);
    }

    /// Snapshot of the budget.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn metrics(&self) -> MemoryMetrics {
        let slot = self.slot();
        let state = self.state.lock();
        let trend = self.trend(&state);
        let decisions = state.granted + state.denied;
        MemoryMetrics {
            allocated: state.current,
            available: state.limit.saturating_sub(state.current),
            limit: state.limit,
            peak: state.peak,
            slot_peak: state.slot_peak(slot),
            utilization: if state.limit == 0 {
                1.0
            } else {
                state.current as f64 / state.limit as f64
            },
            efficiency: if decisions == 0 {
                1.0
            } else {
                state.granted as f64 / decisions as f64
            },
            granted: state.granted,
            denied: state.denied,
            trend,
            predicted_peak: self.predicted_peak(&state, slot),
        }
    }
}
