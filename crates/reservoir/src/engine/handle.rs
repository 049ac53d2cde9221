//! Checked-out resources.

use reservoir_core::{
    BufferPayload, HandlePayload, ParticlePayload, Payload, Poolable, ResourceId, ResourceKind,
    TexturePayload,
};

/// Exclusive access to one pooled resource.
///
/// The handle owns the payload while the resource is checked out; handing it
/// back through [`crate::PoolingEngine::release`] returns the payload to the
/// pool. A handle that is dropped instead keeps its slot occupied until the
/// pool is destroyed.
#[derive(Debug)]
#[must_use = "a dropped handle keeps its pool slot until the pool is destroyed"]
pub struct ResourceHandle {
    pub(crate) pool: String,
    pub(crate) id: ResourceId,
    pub(crate) payload: Payload,
}

impl ResourceHandle {
    /// Pool the resource belongs to.
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &str {
        &self.pool
    }

    /// Resource id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Resource family.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.payload.kind()
    }

    /// Read access to the payload.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Particle payload, if this is a particle resource.
    pub fn as_particle_mut(&mut self) -> Option<&mut ParticlePayload> {
        self.payload.as_particle_mut()
    }

    /// Byte buffer, if this is a buffer resource.
    pub fn as_buffer_mut(&mut self) -> Option<&mut BufferPayload> {
        self.payload.as_buffer_mut()
    }

    /// Opaque handle, if this is a handle resource.
    pub fn as_handle_mut(&mut self) -> Option<&mut HandlePayload> {
        self.payload.as_handle_mut()
    }

    /// Texture, if this is a texture resource.
    pub fn as_texture_mut(&mut self) -> Option<&mut TexturePayload> {
        self.payload.as_texture_mut()
    }
}
