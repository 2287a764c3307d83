/// A single acquired swapchain frame.
///
/// Short-lived: holding the surface texture blocks acquisition of the next one.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl GpuFrame {
    /// Size of the acquired texture, which may lag the window during a resize.
    pub fn size(&self) -> (u32, u32) {
        let t = &self.surface_texture.texture;
        (t.width(), t.height())
    }
}

/// Result of asking the surface for the next frame.
pub enum Acquire {
    Ready(GpuFrame),
    /// No frame this iteration; try again on the next redraw.
    Skip,
    /// The device can no longer present.
    Fatal(wgpu::SurfaceError),
}
