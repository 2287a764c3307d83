/// How the GPU layer is brought up.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Vertical blanks to wait per present. `1` paces to the display, `0`
    /// presents as soon as a frame is ready. Values above one are treated as
    /// one.
    pub swap_interval: u32,

    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
}

impl GpuInit {
    /// Present mode for the configured swap interval.
    pub fn present_mode(&self) -> wgpu::PresentMode {
        match self.swap_interval {
            0 => wgpu::PresentMode::AutoNoVsync,
            _ => wgpu::PresentMode::Fifo,
        }
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            swap_interval: 1,
            prefer_srgb: true,
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
        }
    }
}
