use std::ops::Range;

use anyhow::{Context, Result};
use texbuf_obj::Mesh;

use super::buffer_texture::BufferTexture;
use super::shader::bindings::{MESH_GROUP, POSITIONS_UNIT, TRIANGLES_UNIT};
use super::shader::{CompiledUnit, ProgramTargets, ShaderProgram, MESH_BINDINGS};
use super::{RenderCtx, RenderTarget};
use crate::camera::{CameraConfig, OrbitCamera};

/// Neutral gray.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.5,
    g: 0.5,
    b: 0.5,
    a: 1.0,
};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Vertices drawn for `triangle_count` triangles, or `None` when there is
/// nothing to draw.
pub fn draw_range(triangle_count: u32) -> Option<Range<u32>> {
    match triangle_count {
        0 => None,
        n => Some(0..n.saturating_mul(3)),
    }
}

/// Largest buffer a storage binding on this device can address.
fn binding_limit(limits: &wgpu::Limits) -> u64 {
    u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size)
}

fn ensure_bindable(what: &str, bytes: usize, limit: u64) -> Result<()> {
    anyhow::ensure!(
        bytes as u64 <= limit,
        "mesh {what} take {bytes} bytes, the device binds at most {limit} per buffer"
    );
    Ok(())
}

/// Everything the mesh pipeline owns: program, both buffer-textures, their
/// bind group, the depth target and the camera.
///
/// Built once after the GPU context exists; `update` then `render` once per
/// frame. Dropping it releases every GPU resource.
pub struct RenderContext {
    program: ShaderProgram,
    positions: BufferTexture,
    triangles: BufferTexture,
    bind_group: wgpu::BindGroup,

    depth: Option<DepthTarget>,
    camera: OrbitCamera,
}

struct DepthTarget {
    size: (u32, u32),
    view: wgpu::TextureView,
}

impl RenderContext {
    /// Links the program and uploads `mesh` into the two buffer-textures.
    ///
    /// The mesh is only read; the caller may drop it afterwards.
    pub fn new(
        ctx: &RenderCtx<'_>,
        mesh: &Mesh,
        vertex: &CompiledUnit,
        fragment: &CompiledUnit,
        camera: CameraConfig,
    ) -> Result<Self> {
        let program = ShaderProgram::link(
            ctx.device,
            vertex,
            fragment,
            MESH_BINDINGS,
            ProgramTargets {
                color: ctx.surface_format,
                depth: Some(DEPTH_FORMAT),
            },
        )
        .context("failed to link mesh program")?;

        let limit = binding_limit(&ctx.device.limits());
        ensure_bindable("positions", std::mem::size_of_val(mesh.positions.as_slice()), limit)?;
        ensure_bindable("triangles", std::mem::size_of_val(mesh.triangles.as_slice()), limit)?;

        let positions = BufferTexture::from_positions(ctx.device, "texbuf positions", &mesh.positions);
        let triangles = BufferTexture::from_triangles(ctx.device, "texbuf triangles", &mesh.triangles);

        let bind_group = program.bind_group(
            ctx.device,
            &[(POSITIONS_UNIT, &positions), (TRIANGLES_UNIT, &triangles)],
        )?;

        let scene = Self {
            program,
            positions,
            triangles,
            bind_group,
            depth: None,
            camera: OrbitCamera::new(camera),
        };
        log::info!(
            "mesh uploaded: {} positions, {} triangles",
            scene.positions.view().len(),
            scene.triangle_count()
        );
        Ok(scene)
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    /// Triangles addressable through the index buffer-texture.
    pub fn triangle_count(&self) -> u32 {
        self.triangles.view().len() / 3
    }

    /// Advances the orbit one frame and uploads the new `MVP`.
    ///
    /// Call once per frame, before [`RenderContext::render`].
    pub fn update(&mut self, queue: &wgpu::Queue) {
        let mvp = self.camera.advance();
        self.program
            .set_uniform_mat4(queue, self.program.mvp_location(), &mvp);
    }

    /// Clears color and depth, then draws the mesh.
    ///
    /// Program and bind group are set every frame; with a single pipeline the
    /// repeat is free. The vertex stage fetches its own geometry, so the draw
    /// is non-indexed over `3 * triangle_count` vertices.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        self.ensure_depth(ctx.device, target.size);
        let Some(depth) = self.depth.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("texbuf mesh pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let Some(vertices) = draw_range(self.triangle_count()) else { return };

        rpass.set_pipeline(self.program.pipeline());
        rpass.set_bind_group(MESH_GROUP, &self.bind_group, &[]);
        rpass.draw(vertices, 0..1);
    }

    fn ensure_depth(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        let (w, h) = size;
        if w == 0 || h == 0 {
            return;
        }
        if self.depth.as_ref().is_some_and(|d| d.size == size) {
            return;
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("texbuf depth"),
            size: wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        self.depth = Some(DepthTarget {
            size,
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shader::ShaderStage;
    use crate::render::shaders::{MESH_FRAGMENT_WGSL, MESH_VERTEX_WGSL};
    use crate::render::testing::noop_device;

    const ONE_TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
    const SURFACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

    fn build(device: &wgpu::Device, queue: &wgpu::Queue, mesh: &Mesh) -> Result<RenderContext> {
        let ctx = RenderCtx {
            device,
            queue,
            surface_format: SURFACE_FORMAT,
        };
        let vertex = CompiledUnit::compile("vs", MESH_VERTEX_WGSL, ShaderStage::Vertex).unwrap();
        let fragment = CompiledUnit::compile("fs", MESH_FRAGMENT_WGSL, ShaderStage::Fragment).unwrap();
        RenderContext::new(&ctx, mesh, &vertex, &fragment, CameraConfig::default())
    }

    /// Records one frame into a 64x48 offscreen target and submits it.
    fn draw_frame(device: &wgpu::Device, queue: &wgpu::Queue, scene: &mut RenderContext) {
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("test color"),
            size: wgpu::Extent3d {
                width: 64,
                height: 48,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SURFACE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());

        scene.update(queue);
        {
            let ctx = RenderCtx {
                device,
                queue,
                surface_format: SURFACE_FORMAT,
            };
            let mut target = RenderTarget {
                encoder: &mut encoder,
                color_view: &view,
                size: (64, 48),
            };
            scene.render(&ctx, &mut target);
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    #[test]
    fn one_triangle_draws_three_vertices() {
        let mesh = texbuf_obj::parse_str(ONE_TRIANGLE);
        let count = mesh.triangle_count() as u32;
        assert_eq!(draw_range(count), Some(0..3));
    }

    #[test]
    fn empty_mesh_skips_draw() {
        let mesh = texbuf_obj::parse_str("");
        assert_eq!(draw_range(mesh.triangle_count() as u32), None);
    }

    #[test]
    fn vertex_count_is_three_per_triangle() {
        assert_eq!(draw_range(12).map(|r| r.len()), Some(36));
    }

    #[test]
    fn one_triangle_scene_builds_and_renders() {
        let (device, queue) = noop_device();
        let mut scene = build(&device, &queue, &texbuf_obj::parse_str(ONE_TRIANGLE)).unwrap();

        assert_eq!(scene.triangle_count(), 1);
        assert_eq!(scene.positions.view().len(), 3);
        assert_eq!(scene.triangles.view().len(), 3);
        assert!(scene.program.mvp_location().is_some());

        draw_frame(&device, &queue, &mut scene);
        assert_eq!(scene.depth.as_ref().map(|d| d.size), Some((64, 48)));
        assert_eq!(scene.camera().frame(), 1);
    }

    #[test]
    fn empty_scene_builds_and_only_clears() {
        let (device, queue) = noop_device();
        let mut scene = build(&device, &queue, &Mesh::default()).unwrap();

        assert_eq!(scene.triangle_count(), 0);
        assert!(scene.positions.view().is_empty());
        draw_frame(&device, &queue, &mut scene);
    }

    #[test]
    fn oversized_mesh_is_refused() {
        let limits = wgpu::Limits {
            max_storage_buffer_binding_size: 24,
            ..Default::default()
        };
        let limit = binding_limit(&limits);
        assert_eq!(limit, 24);
        ensure_bindable("positions", 24, limit).unwrap();
        let err = ensure_bindable("positions", 36, limit).unwrap_err();
        assert!(err.to_string().contains("36 bytes"), "{err}");
    }
}
