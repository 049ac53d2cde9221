//! # Memory Budget
//!
//! Process-wide accounting shared by every pool.
//!
//! ## Admission
//!
//! A new resource is admitted only when both hold:
//! - `current + size < limit * headroom_ratio` (hard headroom)
//! - `max(slot_peak, current) * trend + size < limit` (predicted peak)
//!
//! `slot_peak` is the highest usage ever seen in the current [`TimeSlot`], so a
//! slot that historically bursts keeps room for its burst. The trend is the
//! ratio of recent to earlier allocation sizes, so a single large sample does
//! not starve a historically safe workload, while a steady climb toward
//! exhaustion is refused before it arrives.
//!
//! [`TimeSlot`]: crate::TimeSlot

mod budget;
mod window;

pub use budget::{MemoryManager, MemoryMetrics};
pub use window::{clamped_ratio, SampleWindow};
