/// Device handles a renderer needs outside of a frame.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
}

/// One acquired frame: the encoder to record into and its color target.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    /// Color target size in physical pixels; depth attachments must match.
    pub size: (u32, u32),
}
