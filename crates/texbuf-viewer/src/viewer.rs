use texbuf_engine::camera::CameraConfig;
use texbuf_engine::core::{App, AppControl, FrameCtx};
use texbuf_engine::render::shader::CompiledUnit;
use texbuf_engine::render::RenderContext;
use texbuf_obj::Mesh;

/// Frames between timing reports at debug level.
const REPORT_INTERVAL: u64 = 600;

/// Draws one mesh with an orbiting camera until the window closes.
///
/// GPU state is built on the first frame, once a device exists. A setup
/// failure (typically a link error) ends the loop and is kept for `main`.
pub struct Viewer {
    mesh: Option<Mesh>,
    vertex: CompiledUnit,
    fragment: CompiledUnit,
    camera: CameraConfig,

    scene: Option<RenderContext>,
    failure: Option<anyhow::Error>,
}

impl Viewer {
    pub fn new(mesh: Mesh, vertex: CompiledUnit, fragment: CompiledUnit, camera: CameraConfig) -> Self {
        Self {
            mesh: Some(mesh),
            vertex,
            fragment,
            camera,
            scene: None,
            failure: None,
        }
    }

    /// Consumes the viewer, returning the setup error if there was one.
    pub fn finish(self) -> anyhow::Result<()> {
        match self.failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn setup(&mut self, ctx: &FrameCtx<'_, '_>) -> anyhow::Result<RenderContext> {
        // The CPU copy is not needed once it is on the GPU.
        let mesh = self.mesh.take().unwrap_or_default();

        let mut camera = self.camera.clone();
        if let Some(aspect) = ctx.window.aspect_ratio() {
            camera.aspect = aspect;
        }

        RenderContext::new(&ctx.render_ctx(), &mesh, &self.vertex, &self.fragment, camera)
    }
}

impl App for Viewer {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.scene.is_none() {
            match self.setup(ctx) {
                Ok(scene) => self.scene = Some(scene),
                Err(e) => {
                    log::error!("render setup failed: {e:#}");
                    self.failure = Some(e);
                    return AppControl::Exit;
                }
            }
        }
        let Some(scene) = self.scene.as_mut() else {
            return AppControl::Exit;
        };

        scene.update(ctx.gpu.queue());

        let frame = ctx.time.frame_index;
        if frame > 0 && frame % REPORT_INTERVAL == 0 {
            log::debug!(
                "frame {frame}: {:.2} ms ({:.1} fps avg), orbit angle {:.4}",
                ctx.time.dt * 1000.0,
                ctx.time.average_fps().unwrap_or(0.0),
                scene.camera().angle()
            );
        }

        ctx.render(|rctx, target| scene.render(rctx, target))
    }
}
