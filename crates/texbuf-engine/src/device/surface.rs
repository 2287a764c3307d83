use winit::dpi::PhysicalSize;

/// What to do after `get_current_texture` fails.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Recovery {
    Reconfigure,
    Skip,
    Fatal,
}

pub(crate) fn recovery_for(err: &wgpu::SurfaceError) -> Recovery {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Recovery::Reconfigure,
        wgpu::SurfaceError::OutOfMemory => Recovery::Fatal,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => Recovery::Skip,
    }
}

pub(crate) fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let srgb = formats.iter().copied().find(|f| f.is_srgb());
    match srgb {
        Some(f) if prefer_srgb => Some(f),
        _ => formats.first().copied(),
    }
}

/// The window surface together with its configuration and drawable size.
pub(crate) struct SurfaceState<'w> {
    pub surface: wgpu::Surface<'w>,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
}

impl<'w> SurfaceState<'w> {
    pub fn is_drawable(&self) -> bool {
        self.size.width > 0 && self.size.height > 0
    }

    /// Records the new size and reconfigures unless the window is minimized.
    pub fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
        self.size = size;
        if !self.is_drawable() {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(device, &self.config);
    }

    pub fn recover(&self, device: &wgpu::Device, err: &wgpu::SurfaceError) -> Recovery {
        let recovery = recovery_for(err);
        log::warn!("surface error: {err} ({recovery:?})");
        if recovery == Recovery::Reconfigure && self.is_drawable() {
            self.surface.configure(device, &self.config);
        }
        recovery
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat as F;

    #[test]
    fn srgb_preferred_when_present() {
        let formats = [F::Bgra8Unorm, F::Bgra8UnormSrgb];
        assert_eq!(choose_surface_format(&formats, true), Some(F::Bgra8UnormSrgb));
        assert_eq!(choose_surface_format(&formats, false), Some(F::Bgra8Unorm));
    }

    #[test]
    fn falls_back_to_first_format() {
        assert_eq!(choose_surface_format(&[F::Rgba16Float], true), Some(F::Rgba16Float));
        assert_eq!(choose_surface_format(&[], true), None);
    }

    #[test]
    fn lost_surfaces_are_reconfigured() {
        assert_eq!(recovery_for(&wgpu::SurfaceError::Lost), Recovery::Reconfigure);
        assert_eq!(recovery_for(&wgpu::SurfaceError::Outdated), Recovery::Reconfigure);
        assert_eq!(recovery_for(&wgpu::SurfaceError::Timeout), Recovery::Skip);
        assert_eq!(recovery_for(&wgpu::SurfaceError::OutOfMemory), Recovery::Fatal);
    }
}
