use winit::window::Window;

use crate::device::{Acquire, Gpu};
use crate::render::{RenderCtx, RenderTarget};
use crate::time::FrameTime;

use super::app::AppControl;

/// The viewer window.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Physical size as `(width, height)`.
    pub fn physical_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    /// Width over height, or `None` while minimized.
    pub fn aspect_ratio(&self) -> Option<f32> {
        match self.physical_size() {
            (0, _) | (_, 0) => None,
            (w, h) => Some(w as f32 / h as f32),
        }
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
}

impl FrameCtx<'_, '_> {
    /// Device access for setup and uploads, sized to the window.
    pub fn render_ctx(&self) -> RenderCtx<'_> {
        RenderCtx {
            device: self.gpu.device(),
            queue: self.gpu.queue(),
            surface_format: self.gpu.surface_format(),
        }
    }

    /// Acquires a frame, lets `draw` record into it, then presents.
    ///
    /// `draw` owns clearing. A skipped acquisition is not an error; a fatal
    /// one ends the loop.
    pub fn render<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        let mut frame = match self.gpu.acquire() {
            Acquire::Ready(frame) => frame,
            Acquire::Skip => return AppControl::Continue,
            Acquire::Fatal(err) => {
                log::error!("cannot present: {err}");
                return AppControl::Exit;
            }
        };

        let size = frame.size();
        {
            let mut target = RenderTarget {
                encoder: &mut frame.encoder,
                color_view: &frame.view,
                size,
            };
            draw(&self.render_ctx(), &mut target);
        }

        self.window.window.pre_present_notify();
        self.gpu.present(frame);
        AppControl::Continue
    }
}
