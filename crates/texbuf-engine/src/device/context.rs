use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::capability::{check_buffer_texture_support, REQUIRED_VERTEX_STORAGE_BUFFERS};
use super::surface::{self, Recovery, SurfaceState};
use super::{Acquire, GpuFrame, GpuInit};

/// Device, queue and swapchain for one window.
///
/// The window must outlive the `Gpu`; the runtime keeps both in one
/// self-referencing entry.
pub struct Gpu<'w> {
    surface: SurfaceState<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl<'w> Gpu<'w> {
    /// Creates a GPU context bound to `window`.
    ///
    /// Fails if no adapter can present to the window or if the adapter cannot
    /// read buffer-textures from the vertex stage.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let adapter_info = adapter.get_info();
        log::info!("using adapter {} ({:?})", adapter_info.name, adapter_info.backend);

        check_buffer_texture_support(
            &adapter_info.name,
            &adapter.get_downlevel_capabilities(),
            &adapter.limits(),
        )?;

        // Ask only for what the mesh pipeline binds, on top of the adapter's
        // downlevel baseline.
        let required_limits = wgpu::Limits {
            max_storage_buffers_per_shader_stage: REQUIRED_VERTEX_STORAGE_BUFFERS,
            ..wgpu::Limits::downlevel_defaults()
        }
        .using_resolution(adapter.limits());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("texbuf device"),
                required_features: wgpu::Features::empty(),
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps.formats, init.prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode(),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::debug!("surface {format:?} {}x{} {:?}", size.width, size.height, config.present_mode);

        Ok(Self {
            surface: SurfaceState {
                surface,
                config,
                size,
            },
            device,
            queue,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface.config.format
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.surface.resize(&self.device, new_size);
    }

    /// Acquires the next surface texture and an encoder to record into.
    ///
    /// Lost or outdated surfaces are reconfigured here and the frame skipped.
    pub fn acquire(&self) -> Acquire {
        if !self.surface.is_drawable() {
            return Acquire::Skip;
        }

        let surface_texture = match self.surface.surface.get_current_texture() {
            Ok(t) => t,
            Err(err) => {
                return match self.surface.recover(&self.device, &err) {
                    Recovery::Fatal => Acquire::Fatal(err),
                    Recovery::Reconfigure | Recovery::Skip => Acquire::Skip,
                };
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("texbuf frame encoder"),
            });

        Acquire::Ready(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the recorded commands and presents the frame.
    pub fn present(&self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;
        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
    }
}
