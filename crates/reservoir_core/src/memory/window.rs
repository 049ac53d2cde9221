//! Bounded sample window with a half-over-half trend estimate.

use std::collections::VecDeque;

/// Ratio `recent / earlier`, clamped to `[min, max]`.
///
/// Returns 1.0 when there is no earlier signal to compare against.
#[must_use]
pub fn clamped_ratio(recent: f64, earlier: f64, min: f64, max: f64) -> f64 {
    if earlier <= 0.0 || !earlier.is_finite() || !recent.is_finite() {
        return 1.0;
    }
    (recent / earlier).clamp(min, max)
}

/// The last `capacity` samples, oldest first.
#[derive(Clone, Debug)]
pub struct SampleWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SampleWindow {
    /// Creates an empty window.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a sample, evicting the oldest when full.
    pub fn push(&mut self, sample: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Number of samples held.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no samples are held.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean of all samples, 0 when empty.
    #[must_use]
    pub fn mean(&self) -> f64 {
        mean(self.samples.iter().copied(), self.samples.len())
    }

    /// Mean of the newer half over mean of the older half, clamped.
    ///
    /// 1.0 until at least `min_samples` (and never fewer than 2) are held.
    #[must_use]
    pub fn trend(&self, min_samples: usize, min: f64, max: f64) -> f64 {
        let len = self.samples.len();
        if len < min_samples.max(2) {
            return 1.0;
        }
        let split = len / 2;
        let earlier = mean(self.samples.iter().take(split).copied(), split);
        let recent = mean(self.samples.iter().skip(split).copied(), len - split);
        clamped_ratio(recent, earlier, min, max)
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    values.sum::<f64>() / count as f64
}
