//! # Resource Factories
//!
//! The pool never builds payloads itself. A [`ResourceFactory`] constructs them
//! on a miss, estimates their accounted size, and runs a cleanup hook when a
//! resource leaves the system.

use serde::{Deserialize, Serialize};

use crate::error::{CollaboratorError, PoolError, PoolResult};
use crate::resource::{
    BufferPayload, ParticlePayload, Payload, Poolable, ResourceKind, TextureFormat,
    TexturePayload,
};

/// Builds and tears down payloads of a kind.
pub trait ResourceFactory: Send + Sync {
    /// Builds a fresh payload in canonical state.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when the payload cannot be built.
    fn construct(&self, kind: ResourceKind) -> Result<Payload, CollaboratorError>;

    /// Bytes charged against the budgets for one resource of `kind`.
    fn estimate_size(&self, kind: ResourceKind) -> usize;

    /// Runs when a resource is disposed. Default resets the payload.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when teardown fails. Callers log and move on.
    fn cleanup(&self, payload: &mut Payload) -> Result<(), CollaboratorError> {
        payload.reset();
        Ok(())
    }
}

/// Sizes used by [`DefaultFactory`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorySettings {
    /// Reserved capacity of new byte buffers.
    pub buffer_capacity: usize,
    /// New texture width.
    pub texture_width: u32,
    /// New texture height.
    pub texture_height: u32,
    /// New texture format.
    pub texture_format: TextureFormat,
}

impl Default for FactorySettings {
    fn default() -> Self {
        Self {
            buffer_capacity: 4 * 1024,
            texture_width: 64,
            texture_height: 64,
            texture_format: TextureFormat::Rgba8,
        }
    }
}

impl FactorySettings {
    /// Bytes in one new texture's pixel buffer, `None` on overflow.
    #[must_use]
    pub fn texture_bytes(&self) -> Option<usize> {
        self.texture_format
            .byte_len(self.texture_width, self.texture_height)
    }

    /// Rejects texture dimensions whose pixel buffer does not fit in memory.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] when
    /// `texture_width * texture_height * bytes_per_pixel` overflows.
    pub fn validate(&self) -> PoolResult<()> {
        match self.texture_bytes() {
            Some(_) => Ok(()),
            None => Err(PoolError::InvalidConfiguration(format!(
                "texture {}x{} overflows the address space",
                self.texture_width, self.texture_height
            ))),
        }
    }
}

/// Builds canonical payloads for every kind.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultFactory {
    settings: FactorySettings,
}

impl DefaultFactory {
    /// Creates a factory with the given sizes.
    #[must_use]
    pub const fn new(settings: FactorySettings) -> Self {
        Self { settings }
    }

    /// Active sizes.
    #[inline]
    #[must_use]
    pub const fn settings(&self) -> &FactorySettings {
        &self.settings
    }
}

impl ResourceFactory for DefaultFactory {
    fn construct(&self, kind: ResourceKind) -> Result<Payload, CollaboratorError> {
        let s = &self.settings;
        Ok(match kind {
            ResourceKind::Particle => Payload::Particle(ParticlePayload::default()),
            ResourceKind::Buffer => {
                Payload::Buffer(BufferPayload::with_capacity(s.buffer_capacity))
            }
            ResourceKind::Handle => Payload::empty(ResourceKind::Handle),
            ResourceKind::Texture => Payload::Texture(
                TexturePayload::new(s.texture_width, s.texture_height, s.texture_format)
                    .ok_or_else(|| CollaboratorError::new("texture dimensions overflow"))?,
            ),
        })
    }

    fn estimate_size(&self, kind: ResourceKind) -> usize {
        let s = &self.settings;
        let bytes = match kind {
            ResourceKind::Particle => std::mem::size_of::<ParticlePayload>(),
            ResourceKind::Buffer => s.buffer_capacity,
            ResourceKind::Handle => std::mem::size_of::<crate::resource::HandlePayload>(),
            // Saturates so an impossible texture is refused by the budget.
            ResourceKind::Texture => s.texture_bytes().unwrap_or(usize::MAX),
        };
        bytes.max(1)
    }
}
