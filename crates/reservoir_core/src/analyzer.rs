//! # Usage Pattern Analyzer
//!
//! Learns how much of each resource kind is requested, and when.
//!
//! Demand is bucketed per `(kind, TimeSlot)` for seasonality. For trend
//! detection each kind keeps a fixed ring of per-interval request counters
//! covering two trend windows, so memory stays constant whatever the request
//! rate. Predictions are advisory: they feed growth recommendations and never
//! gate admission.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

use crate::clock::Timestamp;
use crate::memory::clamped_ratio;
use crate::resource::ResourceKind;

/// Default length of the recent-demand window.
pub const DEFAULT_TREND_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Counter buckets per trend window.
const BUCKETS_PER_WINDOW: u64 = 30;
/// Ring cells: the recent window and the earlier one it is compared with.
const RING_LEN: usize = 2 * BUCKETS_PER_WINDOW as usize;
/// Epoch of a cell that never held a bucket.
const EMPTY: u64 = u64::MAX;

/// Part of the day a request happened in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    /// 06:00 to 11:59.
    Morning,
    /// 12:00 to 17:59.
    Afternoon,
    /// 18:00 to 21:59.
    Evening,
    /// 22:00 to 05:59.
    Night,
}

impl TimeSlot {
    /// Every slot, in [`TimeSlot::index`] order.
    pub const ALL: [Self; 4] = [Self::Morning, Self::Afternoon, Self::Evening, Self::Night];

    /// Position in [`TimeSlot::ALL`], for per-slot arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Maps an hour of day (0..=23, wrapped) to its slot.
    #[must_use]
    pub const fn from_hour(hour: u8) -> Self {
        match hour % 24 {
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            18..=21 => Self::Evening,
            _ => Self::Night,
        }
    }

    /// Demand multiplier for this slot.
    #[must_use]
    pub const fn seasonal(self) -> f64 {
        match self {
            Self::Morning => 1.2,
            Self::Afternoon => 1.5,
            Self::Evening => 1.1,
            Self::Night => 0.6,
        }
    }
}

/// Expected near-term demand for one kind.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prediction {
    /// Resources likely needed over the next window.
    pub count: usize,
    /// Mean requested size in the current slot, 0 without history.
    pub avg_size: usize,
    /// `n / (n + 10)` for `n` samples in the current slot.
    pub confidence: f64,
    /// Recent over earlier request rate, in `[0.5, 2.0]`.
    pub trend: f64,
    /// Slot multiplier applied.
    pub seasonal: f64,
}

#[derive(Clone, Copy, Debug, Default)]
struct SlotStats {
    requests: u64,
    total_bytes: u64,
}

/// Request counts for the last `RING_LEN` buckets of one kind.
#[derive(Clone, Debug)]
struct DemandRing {
    /// Absolute bucket number each cell holds.
    epochs: [u64; RING_LEN],
    counts: [u64; RING_LEN],
}

impl Default for DemandRing {
    fn default() -> Self {
        Self {
            epochs: [EMPTY; RING_LEN],
            counts: [0; RING_LEN],
        }
    }
}

impl DemandRing {
    #[allow(clippy::cast_possible_truncation)]
    fn cell(bucket: u64) -> usize {
        (bucket % RING_LEN as u64) as usize
    }

    fn record(&mut self, bucket: u64) {
        let cell = Self::cell(bucket);
        let epoch = self.epochs[cell];
        if epoch == bucket {
            self.counts[cell] += 1;
        } else if epoch == EMPTY || epoch < bucket {
            self.epochs[cell] = bucket;
            self.counts[cell] = 1;
        }
        // Otherwise the request is older than the ring and is dropped.
    }

    /// `(recent, earlier)` request counts relative to `current`.
    fn split(&self, current: u64) -> (u64, u64) {
        self.epochs
            .iter()
            .zip(&self.counts)
            .fold((0, 0), |(recent, earlier), (&epoch, &count)| {
                if epoch == EMPTY {
                    return (recent, earlier);
                }
                match current.checked_sub(epoch) {
                    Some(age) if age < BUCKETS_PER_WINDOW => (recent + count, earlier),
                    Some(age) if age < 2 * BUCKETS_PER_WINDOW => (recent, earlier + count),
                    _ => (recent, earlier),
                }
            })
    }
}

#[derive(Debug, Default)]
struct History {
    slots: HashMap<(ResourceKind, TimeSlot), SlotStats>,
    demand: HashMap<ResourceKind, DemandRing>,
}

/// Demand history shared across pools.
#[derive(Debug)]
pub struct UsagePatternAnalyzer {
    trend_window: Duration,
    history: Mutex<History>,
}

impl Default for UsagePatternAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_TREND_WINDOW)
    }
}

impl UsagePatternAnalyzer {
    /// Creates an analyzer. A zero window falls back to the default.
    #[must_use]
    pub fn new(trend_window: Duration) -> Self {
        let trend_window = if trend_window.is_zero() {
            DEFAULT_TREND_WINDOW
        } else {
            trend_window
        };
        Self {
            trend_window,
            history: Mutex::new(History::default()),
        }
    }

    /// Length of the recent-demand window.
    #[inline]
    #[must_use]
    pub const fn trend_window(&self) -> Duration {
        self.trend_window
    }

    /// Records one request of `size_bytes` for `kind`.
    pub fn record(&self, kind: ResourceKind, size_bytes: usize, now: Timestamp, hour: u8) {
        let slot = TimeSlot::from_hour(hour);
        let bucket = self.bucket(now);
        let mut history = self.history.lock();

        let stats = history.slots.entry((kind, slot)).or_default();
        stats.requests += 1;
        stats.total_bytes = stats.total_bytes.saturating_add(size_bytes as u64);

        history.demand.entry(kind).or_default().record(bucket);
    }

    /// Predicts demand for `kind` at `now`.
    ///
    /// Recent demand is counted in whole buckets of `trend_window / 30`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn predict(&self, kind: ResourceKind, now: Timestamp, hour: u8) -> Prediction {
        let slot = TimeSlot::from_hour(hour);
        let current = self.bucket(now);
        let history = self.history.lock();

        let (recent, earlier) = history
            .demand
            .get(&kind)
            .map_or((0, 0), |ring| ring.split(current));
        let trend = clamped_ratio(recent as f64, earlier as f64, 0.5, 2.0);
        let seasonal = slot.seasonal();

        let stats = history.slots.get(&(kind, slot)).copied().unwrap_or_default();
        let samples = stats.requests as f64;
        let avg_size = if stats.requests == 0 {
            0
        } else {
            (stats.total_bytes / stats.requests) as usize
        };

        Prediction {
            count: (recent as f64 * trend * seasonal).ceil() as usize,
            avg_size,
            confidence: samples / (samples + 10.0),
            trend,
            seasonal,
        }
    }

    /// Forgets all history.
    pub fn reset(&self) {
        let mut history = self.history.lock();
        history.slots.clear();
        history.demand.clear();
    }

    fn bucket(&self, now: Timestamp) -> u64 {
        let window = u64::try_from(self.trend_window.as_millis()).unwrap_or(u64::MAX);
        now.as_millis() / (window / BUCKETS_PER_WINDOW).max(1)
    }
}
