//! Buffer-backed textures.
//!
//! A `BufferTexture` is a write-once GPU buffer that shaders address by
//! element index (`positions[i]`) instead of receiving it as a vertex
//! attribute stream. WebGPU has no texel-buffer object; a read-only storage
//! binding plays that role, and the [`TexelView`] carries the element format
//! that decides how the raw bytes are read back on the shader side.
//!
//! The format is a contract with the producer. Nothing checks that the bytes
//! handed to [`BufferTexture::create`] really are laid out as declared; a
//! mismatch only shows up as wrong geometry on screen.

use std::num::NonZeroU64;

use wgpu::util::DeviceExt;

/// Per-element layout of a buffer-texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ElementFormat {
    /// Three packed `f32` per element (a position). Read in WGSL as
    /// `array<f32>`, element `i` at `[3i, 3i + 1, 3i + 2]`.
    Rgb32Float,
    /// One `i32` per element (a vertex index). Read in WGSL as `array<i32>`.
    R32Sint,
}

impl ElementFormat {
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgb32Float => 3,
            Self::R32Sint => 1,
        }
    }

    /// Size of one element in bytes.
    pub const fn element_size(self) -> usize {
        // Both formats use 32-bit channels.
        self.channels() * 4
    }

    /// WGSL scalar a shader must declare its array with to read this format.
    pub fn wgsl_scalar(self) -> naga::Scalar {
        match self {
            Self::Rgb32Float => naga::Scalar::F32,
            Self::R32Sint => naga::Scalar::I32,
        }
    }
}

/// Typed view over a buffer: which format, how many addressable elements.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TexelView {
    format: ElementFormat,
    len: u32,
}

impl TexelView {
    /// View over `byte_len` bytes. Trailing bytes that do not fill a whole
    /// element are not addressable.
    pub fn new(format: ElementFormat, byte_len: usize) -> Self {
        let len = byte_len / format.element_size();
        Self {
            format,
            len: u32::try_from(len).unwrap_or(u32::MAX),
        }
    }

    pub fn format(&self) -> ElementFormat {
        self.format
    }

    /// Number of sampleable elements.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes covered by the view.
    pub fn byte_len(&self) -> u64 {
        u64::from(self.len) * self.format.element_size() as u64
    }

    /// Size of the binding range. WebGPU rejects zero-sized bindings, so an
    /// empty view still binds one (unused) element.
    pub fn binding_size(&self) -> NonZeroU64 {
        NonZeroU64::new(self.byte_len()).unwrap_or(MIN_BINDING_SIZE)
    }
}

// One element of the widest format.
const MIN_BINDING_SIZE: NonZeroU64 = match NonZeroU64::new(ElementFormat::Rgb32Float.element_size() as u64) {
    Some(n) => n,
    None => unreachable!(),
};

/// A GPU buffer plus the texel view that makes it index-addressable.
///
/// Write-once: the buffer carries no `COPY_DST` usage, so the view created
/// here is never invalidated.
pub struct BufferTexture {
    buffer: wgpu::Buffer,
    view: TexelView,
}

impl BufferTexture {
    /// Uploads `data` and binds a texel view of `format` over it.
    pub fn create(device: &wgpu::Device, label: &str, data: &[u8], format: ElementFormat) -> Self {
        let view = TexelView::new(format, data.len());

        let padded;
        let contents = if (data.len() as u64) < view.binding_size().get() {
            padded = vec![0u8; view.binding_size().get() as usize];
            &padded[..]
        } else {
            data
        };

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: wgpu::BufferUsages::STORAGE,
        });

        log::debug!(
            "buffer-texture `{label}`: {:?} x {} ({} bytes)",
            view.format(),
            view.len(),
            view.byte_len()
        );

        Self { buffer, view }
    }

    /// Positions as `Rgb32Float`.
    pub fn from_positions(device: &wgpu::Device, label: &str, positions: &[[f32; 3]]) -> Self {
        Self::create(device, label, bytemuck::cast_slice(positions), ElementFormat::Rgb32Float)
    }

    /// Triangle vertex indices as `R32Sint`, flattened corner by corner.
    pub fn from_triangles(device: &wgpu::Device, label: &str, triangles: &[[i32; 3]]) -> Self {
        Self::create(device, label, bytemuck::cast_slice(triangles), ElementFormat::R32Sint)
    }

    pub fn view(&self) -> TexelView {
        self.view
    }

    /// Resource for a bind-group entry at the resource's unit.
    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: Some(self.view.binding_size()),
        })
    }
}
