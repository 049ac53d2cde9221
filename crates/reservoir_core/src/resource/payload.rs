//! # Resource Payloads
//!
//! One strongly typed payload per [`ResourceKind`], each with a canonical empty
//! state it can be reset to through [`Poolable`].

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use super::ResourceKind;

/// Behaviour shared by every pooled payload.
pub trait Poolable {
    /// The family this payload belongs to.
    fn kind(&self) -> ResourceKind;

    /// Returns the payload to its canonical empty state.
    ///
    /// Must be idempotent: resetting an already reset payload changes nothing.
    fn reset(&mut self);

    /// True when the payload is in its canonical empty state.
    fn is_reset(&self) -> bool;

    /// Approximate heap + inline footprint in bytes.
    fn footprint(&self) -> usize;
}

/// A CPU-side particle record.
///
/// Plain old data: its canonical state is all-zero bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ParticlePayload {
    /// Position (xyz) + age (w)
    pub position_age: [f32; 4],
    /// Velocity (xyz) + lifetime (w)
    pub velocity_lifetime: [f32; 4],
    /// Color (rgba)
    pub color: [f32; 4],
    /// Size (start, end, current) + emission
    pub size_emission: [f32; 4],
}

impl Poolable for ParticlePayload {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Particle
    }

    fn reset(&mut self) {
        *self = Self::zeroed();
    }

    fn is_reset(&self) -> bool {
        bytemuck::bytes_of(self).iter().all(|b| *b == 0)
    }

    fn footprint(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}

/// A reusable byte buffer. Capacity survives reset; contents do not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferPayload {
    /// Buffer contents.
    pub data: Vec<u8>,
}

impl BufferPayload {
    /// Creates an empty buffer with reserved capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }
}

impl Poolable for BufferPayload {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Buffer
    }

    fn reset(&mut self) {
        self.data.clear();
    }

    fn is_reset(&self) -> bool {
        self.data.is_empty()
    }

    fn footprint(&self) -> usize {
        std::mem::size_of::<Self>() + self.data.capacity()
    }
}

/// An opaque handle to something owned elsewhere (a GPU object, a node id).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlePayload {
    /// Raw handle value, `None` when unbound.
    pub raw: Option<u64>,
    /// Caller-assigned label.
    pub label: String,
    /// Bumped every time the handle is rebound.
    pub generation: u32,
}

impl Poolable for HandlePayload {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Handle
    }

    fn reset(&mut self) {
        self.raw = None;
        self.label.clear();
        self.generation = 0;
    }

    fn is_reset(&self) -> bool {
        self.raw.is_none() && self.label.is_empty() && self.generation == 0
    }

    fn footprint(&self) -> usize {
        std::mem::size_of::<Self>() + self.label.capacity()
    }
}

/// Pixel storage formats for texture payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureFormat {
    /// 8-bit RGBA.
    #[default]
    Rgba8,
    /// Single 8-bit channel.
    R8,
}

impl TextureFormat {
    /// Bytes per pixel.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::R8 => 1,
        }
    }

    /// Pixel buffer length for `width x height`, `None` on overflow.
    #[must_use]
    pub fn byte_len(self, width: u32, height: u32) -> Option<usize> {
        usize::try_from(width)
            .ok()?
            .checked_mul(usize::try_from(height).ok()?)?
            .checked_mul(self.bytes_per_pixel())
    }
}

/// A CPU-side texture. Dimensions survive reset; pixels are zeroed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TexturePayload {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: TextureFormat,
    /// Pixel data, `width * height * bytes_per_pixel` long.
    pub pixels: Vec<u8>,
}

impl TexturePayload {
    /// Creates a zeroed texture, or `None` if its size does not fit in `usize`.
    #[must_use]
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Option<Self> {
        let len = format.byte_len(width, height)?;
        Some(Self {
            width,
            height,
            format,
            pixels: vec![0; len],
        })
    }
}

impl Poolable for TexturePayload {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Texture
    }

    fn reset(&mut self) {
        self.pixels.fill(0);
    }

    fn is_reset(&self) -> bool {
        self.pixels.iter().all(|b| *b == 0)
    }

    fn footprint(&self) -> usize {
        std::mem::size_of::<Self>() + self.pixels.capacity()
    }
}

/// Kind-specific resource data.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Particle record.
    Particle(ParticlePayload),
    /// Byte buffer.
    Buffer(BufferPayload),
    /// Opaque handle.
    Handle(HandlePayload),
    /// CPU texture.
    Texture(TexturePayload),
}

impl Payload {
    /// Canonical empty payload for a kind, with default dimensions.
    #[must_use]
    pub fn empty(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Particle => Self::Particle(ParticlePayload::zeroed()),
            ResourceKind::Buffer => Self::Buffer(BufferPayload::default()),
            ResourceKind::Handle => Self::Handle(HandlePayload::default()),
            ResourceKind::Texture => Self::Texture(TexturePayload::default()),
        }
    }

    /// Particle view, if this is a particle.
    #[must_use]
    pub fn as_particle_mut(&mut self) -> Option<&mut ParticlePayload> {
        match self {
            Self::Particle(p) => Some(p),
            _ => None,
        }
    }

    /// Buffer view, if this is a buffer.
    #[must_use]
    pub fn as_buffer_mut(&mut self) -> Option<&mut BufferPayload> {
        match self {
            Self::Buffer(b) => Some(b),
            _ => None,
        }
    }

    /// Handle view, if this is a handle.
    #[must_use]
    pub fn as_handle_mut(&mut self) -> Option<&mut HandlePayload> {
        match self {
            Self::Handle(h) => Some(h),
            _ => None,
        }
    }

    /// Texture view, if this is a texture.
    #[must_use]
    pub fn as_texture_mut(&mut self) -> Option<&mut TexturePayload> {
        match self {
            Self::Texture(t) => Some(t),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn Poolable {
        match self {
            Self::Particle(p) => p,
            Self::Buffer(b) => b,
            Self::Handle(h) => h,
            Self::Texture(t) => t,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Poolable {
        match self {
            Self::Particle(p) => p,
            Self::Buffer(b) => b,
            Self::Handle(h) => h,
            Self::Texture(t) => t,
        }
    }
}

impl Poolable for Payload {
    fn kind(&self) -> ResourceKind {
        self.inner().kind()
    }

    fn reset(&mut self) {
        self.inner_mut().reset();
    }

    fn is_reset(&self) -> bool {
        self.inner().is_reset()
    }

    fn footprint(&self) -> usize {
        self.inner().footprint()
    }
}
