//! # Pooled Resources
//!
//! A [`Resource`] is the unit a pool recycles. Its lifecycle is a small state
//! machine:
//!
//! ```text
//!              acquire                release (recycle)
//!  Available ───────────▶ InUse ───────────────────▶ Recycling
//!      ▲                    │                            │
//!      │   release (keep)   │                            │ cleanup ok
//!      ├────────────────────┘                            │
//!      └─────────────────────────────────────────────────┘
//!  Available | Recycling ──evict / failed cleanup──▶ Disposed (terminal)
//! ```

mod payload;

pub use payload::{
    BufferPayload, HandlePayload, ParticlePayload, Payload, Poolable, TextureFormat,
    TexturePayload,
};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::id::ResourceId;

/// Resource family. Drives which constructor and reset logic applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Particle records.
    Particle,
    /// Byte buffers.
    Buffer,
    /// Opaque handles.
    Handle,
    /// CPU textures.
    Texture,
}

impl ResourceKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 4] = [Self::Particle, Self::Buffer, Self::Handle, Self::Texture];

    /// Stable lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Particle => "particle",
            Self::Buffer => "buffer",
            Self::Handle => "handle",
            Self::Texture => "texture",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle state of a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceState {
    /// Idle and selectable.
    Available,
    /// Checked out by a caller.
    InUse,
    /// Waiting in the recycler queue.
    Recycling,
    /// Dropped for good.
    Disposed,
}

impl ResourceState {
    /// Whether the state machine allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Available, Self::InUse | Self::Disposed)
                | (Self::InUse, Self::Available | Self::Recycling)
                | (Self::Recycling, Self::Available | Self::Disposed)
        )
    }
}

/// A reusable pooled unit.
#[derive(Debug, Clone)]
pub struct Resource {
    id: ResourceId,
    kind: ResourceKind,
    state: ResourceState,
    created_at: Timestamp,
    last_used_at: Timestamp,
    usage_count: u64,
    uses_since_recycle: u64,
    size_bytes: usize,
    priority: f64,
    /// `None` while checked out: the payload travels with the caller's handle.
    payload: Option<Payload>,
}

impl Resource {
    /// Creates an `Available` resource.
    ///
    /// # Panics
    ///
    /// Debug builds assert that `size_bytes` is positive and that the payload
    /// matches `kind`.
    #[must_use]
    pub fn new(
        id: ResourceId,
        kind: ResourceKind,
        size_bytes: usize,
        payload: Payload,
        now: Timestamp,
    ) -> Self {
        debug_assert!(size_bytes > 0, "resources must have a positive size");
        debug_assert_eq!(payload.kind(), kind);
        Self {
            id,
            kind,
            state: ResourceState::Available,
            created_at: now,
            last_used_at: now,
            usage_count: 0,
            uses_since_recycle: 0,
            size_bytes,
            priority: 0.5,
            payload: Some(payload),
        }
    }

    /// Unique id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Resource family.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ResourceState {
        self.state
    }

    /// Creation time.
    #[inline]
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Last acquire or release.
    #[inline]
    #[must_use]
    pub const fn last_used_at(&self) -> Timestamp {
        self.last_used_at
    }

    /// Lifetime acquisitions.
    #[inline]
    #[must_use]
    pub const fn usage_count(&self) -> u64 {
        self.usage_count
    }

    /// Acquisitions since the last successful recycle.
    #[inline]
    #[must_use]
    pub const fn uses_since_recycle(&self) -> u64 {
        self.uses_since_recycle
    }

    /// Accounted size.
    #[inline]
    #[must_use]
    pub const fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Strategy-assigned value in `[0, 1]`.
    #[inline]
    #[must_use]
    pub const fn priority(&self) -> f64 {
        self.priority
    }

    /// Sets the priority, clamped to `[0, 1]`. NaN becomes 0.
    pub fn set_priority(&mut self, priority: f64) {
        self.priority = if priority.is_nan() {
            0.0
        } else {
            priority.clamp(0.0, 1.0)
        };
    }

    /// Time since creation, in seconds.
    #[must_use]
    pub fn age_secs(&self, now: Timestamp) -> f64 {
        now.saturating_since(self.created_at).as_secs_f64()
    }

    /// Time since last use, in seconds.
    #[must_use]
    pub fn idle_secs(&self, now: Timestamp) -> f64 {
        now.saturating_since(self.last_used_at).as_secs_f64()
    }

    /// Payload, when resident.
    #[must_use]
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Mutable payload, when resident.
    pub fn payload_mut(&mut self) -> Option<&mut Payload> {
        self.payload.as_mut()
    }

    /// Removes the payload, leaving the resource without one.
    pub fn take_payload(&mut self) -> Option<Payload> {
        self.payload.take()
    }

    fn transition(&mut self, next: ResourceState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        true
    }

    fn touch(&mut self, now: Timestamp) {
        // Keeps created_at <= last_used_at even if a caller hands in a stale time.
        self.last_used_at = now.max(self.created_at).max(self.last_used_at);
    }

    /// `Available → InUse`: records the use and hands out the payload.
    ///
    /// Returns `None` (and changes nothing) unless the resource is `Available`
    /// with a resident payload.
    pub fn check_out(&mut self, now: Timestamp) -> Option<Payload> {
        if self.state != ResourceState::Available || self.payload.is_none() {
            return None;
        }
        self.transition(ResourceState::InUse);
        self.touch(now);
        self.usage_count += 1;
        self.uses_since_recycle += 1;
        self.payload.take()
    }

    /// `InUse → Available`: the payload comes back as-is.
    ///
    /// On an illegal transition the payload is handed back in `Err`.
    pub fn check_in(&mut self, payload: Payload, now: Timestamp) -> Result<(), Payload> {
        if self.state != ResourceState::InUse || self.kind != payload.kind() {
            return Err(payload);
        }
        self.transition(ResourceState::Available);
        self.payload = Some(payload);
        self.touch(now);
        Ok(())
    }

    /// `InUse → Recycling`: the payload comes back for reset.
    pub fn begin_recycle(&mut self, payload: Payload, now: Timestamp) -> Result<(), Payload> {
        if self.state != ResourceState::InUse || self.kind != payload.kind() {
            return Err(payload);
        }
        self.transition(ResourceState::Recycling);
        self.payload = Some(payload);
        self.touch(now);
        Ok(())
    }

    /// `Recycling → Available` after a successful reset.
    pub fn finish_recycle(&mut self) -> bool {
        if self.state != ResourceState::Recycling {
            return false;
        }
        self.uses_since_recycle = 0;
        self.transition(ResourceState::Available)
    }

    /// `Available | Recycling → Disposed`. Drops the payload.
    pub fn dispose(&mut self) -> bool {
        if !self.transition(ResourceState::Disposed) {
            return false;
        }
        self.payload = None;
        true
    }

    /// `Available | Recycling → Disposed`, keeping the payload for a teardown
    /// hook. Hands the resource back unchanged on an illegal transition.
    pub fn retire(mut self) -> Result<Retired, Self> {
        if !self.transition(ResourceState::Disposed) {
            return Err(self);
        }
        let payload = self.payload.take();
        Ok(Retired {
            resource: self,
            payload,
        })
    }

    /// Forces `Disposed` from any state. Used by teardown only.
    pub(crate) fn force_retire(mut self) -> Retired {
        self.state = ResourceState::Disposed;
        let payload = self.payload.take();
        Retired {
            resource: self,
            payload,
        }
    }
}

/// A disposed resource and the payload it still held.
#[derive(Debug)]
pub struct Retired {
    /// The resource, now `Disposed`.
    pub resource: Resource,
    /// Payload for the collaborator's cleanup hook, if one was resident.
    pub payload: Option<Payload>,
}
