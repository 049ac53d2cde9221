//! # Resource Identity
//!
//! Resource ids are opaque strings handed out by an injectable [`IdSource`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique, immutable resource identifier.
///
/// Ordering is lexicographic; [`SequentialIds`] zero-pads its counter so that
/// lexicographic order matches creation order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(String);

impl ResourceId {
    /// Wraps an existing string id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrowed view of the id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generator of resource ids.
pub trait IdSource: Send + Sync {
    /// Returns a fresh id, never handed out before by this source.
    fn next_id(&self) -> ResourceId;
}

/// Monotonic counter ids: `res-000000000001`, `res-000000000002`, ...
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    /// Creates a generator with the given prefix, starting at 1.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("res")
    }
}

impl IdSource for SequentialIds {
    fn next_id(&self) -> ResourceId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        ResourceId(format!("{}-{n:012}", self.prefix))
    }
}

/// Random v4 UUID ids.
#[derive(Debug, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&self) -> ResourceId {
        ResourceId(uuid::Uuid::new_v4().to_string())
    }
}
