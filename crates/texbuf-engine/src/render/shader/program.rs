use std::collections::HashMap;

use anyhow::{Context, Result};
use glam::Mat4;

use super::bindings::{find_uniform, BindingKind, BindingTable, UniformLocation, MAT4_SIZE, MVP_UNIFORM};
use super::{CompiledUnit, ShaderError, ShaderStage};
use crate::render::buffer_texture::BufferTexture;

/// Attachment formats a program is linked against.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ProgramTargets {
    pub color: wgpu::TextureFormat,
    pub depth: Option<wgpu::TextureFormat>,
}

/// A linked vertex + fragment program.
///
/// Only constructible through a successful [`ShaderProgram::link`], so a
/// failed program can never be activated.
pub struct ShaderProgram {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    table: BindingTable,

    uniforms: HashMap<String, UniformLocation>,
    uniform_buffers: Vec<(UniformLocation, wgpu::Buffer)>,

    /// Cached `MVP` location; `None` if the shaders do not declare it.
    mvp: Option<UniformLocation>,
}

impl ShaderProgram {
    /// Links `vertex` and `fragment` into a render pipeline laid out by `table`.
    ///
    /// Link status is checked before anything is created on the GPU: stage
    /// interfaces must agree and every declared resource must match `table`.
    pub fn link(
        device: &wgpu::Device,
        vertex: &CompiledUnit,
        fragment: &CompiledUnit,
        table: BindingTable,
        targets: ProgramTargets,
    ) -> Result<Self, ShaderError> {
        let uniforms = check_link(vertex, fragment, &table).inspect_err(|e| log::error!("{e}"))?;

        let vs = vertex.create_module(device);
        let fs = fragment.create_module(device);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texbuf mesh bgl"),
            entries: &table.layout_entries(),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("texbuf mesh pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("texbuf mesh pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &vs,
                entry_point: Some(vertex.entry_point()),
                compilation_options: Default::default(),
                // Geometry comes from buffer-textures, not vertex buffers.
                buffers: &[],
            },

            fragment: Some(wgpu::FragmentState {
                module: &fs,
                entry_point: Some(fragment.entry_point()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: targets.color,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: targets.depth.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let uniform_buffers = table
            .slots
            .iter()
            .filter(|slot| slot.kind == BindingKind::UniformMat4)
            .map(|slot| {
                let location = UniformLocation {
                    group: table.group,
                    binding: slot.binding,
                };
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(slot.name),
                    size: MAT4_SIZE,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (location, buffer)
            })
            .collect();

        let mvp = uniforms.get(MVP_UNIFORM).copied();
        if mvp.is_none() {
            log::debug!("program declares no `{MVP_UNIFORM}` uniform");
        }

        log::debug!(
            "linked program `{}` + `{}` ({} uniforms)",
            vertex.label(),
            fragment.label(),
            uniforms.len()
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            table,
            uniforms,
            uniform_buffers,
            mvp,
        })
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// Location of the uniform called `name`, or `None` (the invalid location).
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.get(name).copied()
    }

    /// Cached `MVP` location.
    pub fn mvp_location(&self) -> Option<UniformLocation> {
        self.mvp
    }

    /// Uploads a matrix uniform. An invalid (`None`) or unknown location is a
    /// silent no-op.
    pub fn set_uniform_mat4(&self, queue: &wgpu::Queue, location: Option<UniformLocation>, value: &Mat4) {
        let Some(location) = location else { return };
        let Some((_, buffer)) = self.uniform_buffers.iter().find(|(l, _)| *l == location) else {
            return;
        };
        queue.write_buffer(buffer, 0, bytemuck::bytes_of(value));
    }

    /// Builds the bind group that attaches `textures` at their units next to
    /// the program's own uniform buffers.
    ///
    /// Each texture's element format must be the one the table declares for
    /// its unit.
    pub fn bind_group(
        &self,
        device: &wgpu::Device,
        textures: &[(u32, &BufferTexture)],
    ) -> Result<wgpu::BindGroup> {
        let mut entries = Vec::with_capacity(self.table.slots.len());

        for slot in self.table.slots {
            let resource = match slot.kind {
                BindingKind::UniformMat4 => self
                    .uniform_buffers
                    .iter()
                    .find(|(l, _)| l.binding == slot.binding)
                    .map(|(_, b)| b.as_entire_binding())
                    .with_context(|| format!("no uniform buffer for `{}`", slot.name))?,
                BindingKind::Texels(format) => {
                    let (_, texture) = textures
                        .iter()
                        .find(|(unit, _)| *unit == slot.binding)
                        .with_context(|| {
                            format!("nothing bound to unit {} (`{}`)", slot.binding, slot.name)
                        })?;
                    anyhow::ensure!(
                        texture.view().format() == format,
                        "unit {} (`{}`) expects {format:?}, got {:?}",
                        slot.binding,
                        slot.name,
                        texture.view().format()
                    );
                    texture.binding_resource()
                }
            };
            entries.push(wgpu::BindGroupEntry {
                binding: slot.binding,
                resource,
            });
        }

        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texbuf mesh bind group"),
            layout: &self.bind_group_layout,
            entries: &entries,
        }))
    }
}

/// Link-status check shared by [`ShaderProgram::link`]; needs no GPU.
///
/// Returns the uniform locations declared by either stage.
pub fn check_link(
    vertex: &CompiledUnit,
    fragment: &CompiledUnit,
    table: &BindingTable,
) -> Result<HashMap<String, UniformLocation>, ShaderError> {
    if vertex.stage() != ShaderStage::Vertex || fragment.stage() != ShaderStage::Fragment {
        return Err(ShaderError::link(format!(
            "expected a vertex and a fragment unit, got {} and {}",
            vertex.stage(),
            fragment.stage()
        )));
    }

    let outputs = stage_outputs(vertex);
    for (location, ty) in stage_inputs(fragment) {
        match outputs.iter().find(|(l, _)| *l == location) {
            None => {
                return Err(ShaderError::link(format!(
                    "fragment input @location({location}) is not written by the vertex stage"
                )));
            }
            Some((_, out_ty)) if *out_ty != ty => {
                return Err(ShaderError::link(format!(
                    "@location({location}) is {out_ty:?} in the vertex stage but {ty:?} in the fragment stage"
                )));
            }
            Some(_) => {}
        }
    }

    let mut uniforms = HashMap::new();
    for unit in [vertex, fragment] {
        table
            .check_visibility(unit.stage(), unit.module())
            .and_then(|()| table.validate(unit.module()))
            .map_err(|e| ShaderError::link(format!("{} stage: {e}", unit.stage())))?;

        for (_, var) in unit.module().global_variables.iter() {
            let Some(name) = var.name.as_deref() else { continue };
            let Some(location) = find_uniform(unit.module(), name) else { continue };
            if let Some(prev) = uniforms.insert(name.to_string(), location) {
                if prev != location {
                    return Err(ShaderError::link(format!(
                        "uniform `{name}` is declared at two different bindings"
                    )));
                }
            }
        }
    }

    Ok(uniforms)
}

type Interface = Vec<(u32, naga::TypeInner)>;

fn stage_outputs(unit: &CompiledUnit) -> Interface {
    let mut out = Vec::new();
    if let Some(result) = unit.entry().function.result.as_ref() {
        collect_locations(unit.module(), result.ty, result.binding.as_ref(), &mut out);
    }
    out
}

fn stage_inputs(unit: &CompiledUnit) -> Interface {
    let mut out = Vec::new();
    for arg in &unit.entry().function.arguments {
        collect_locations(unit.module(), arg.ty, arg.binding.as_ref(), &mut out);
    }
    out
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Interface,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.push((*location, module.types[ty].inner.clone()));
        }
        // Built-ins are not part of the user interface.
        Some(_) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_locations(module, m.ty, m.binding.as_ref(), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shader::bindings::{MESH_BINDINGS, MVP_BINDING, POSITIONS_UNIT, TRIANGLES_UNIT};
    use crate::render::shaders;
    use crate::render::testing::noop_device;

    const TARGETS: ProgramTargets = ProgramTargets {
        color: wgpu::TextureFormat::Bgra8UnormSrgb,
        depth: Some(wgpu::TextureFormat::Depth32Float),
    };

    fn builtin_program(device: &wgpu::Device) -> ShaderProgram {
        ShaderProgram::link(
            device,
            &vs(shaders::MESH_VERTEX_WGSL),
            &fs(shaders::MESH_FRAGMENT_WGSL),
            MESH_BINDINGS,
            TARGETS,
        )
        .unwrap()
    }

    fn vs(src: &str) -> CompiledUnit {
        CompiledUnit::compile("vs", src, ShaderStage::Vertex).unwrap()
    }

    fn fs(src: &str) -> CompiledUnit {
        CompiledUnit::compile("fs", src, ShaderStage::Fragment).unwrap()
    }

    const PLAIN_VS: &str = "
struct Out { @builtin(position) p: vec4<f32>, @location(0) c: vec3<f32> };
@vertex fn vs_main() -> Out { var o: Out; o.p = vec4<f32>(0.0); o.c = vec3<f32>(1.0); return o; }
";

    #[test]
    fn builtin_program_links() {
        let uniforms = check_link(
            &vs(shaders::MESH_VERTEX_WGSL),
            &fs(shaders::MESH_FRAGMENT_WGSL),
            &MESH_BINDINGS,
        )
        .unwrap();
        assert_eq!(
            uniforms.get(MVP_UNIFORM),
            Some(&UniformLocation { group: 0, binding: MVP_BINDING })
        );
    }

    #[test]
    fn missing_mvp_is_not_a_link_error() {
        let uniforms = check_link(&vs(PLAIN_VS), &fs(shaders::MESH_FRAGMENT_WGSL), &MESH_BINDINGS)
            .unwrap();
        assert!(uniforms.get(MVP_UNIFORM).is_none());
    }

    #[test]
    fn unwritten_fragment_input_fails_link() {
        let frag = "@fragment fn fs_main(@location(3) x: vec3<f32>) -> @location(0) vec4<f32> { return vec4<f32>(x, 1.0); }";
        let err = check_link(&vs(PLAIN_VS), &fs(frag), &MESH_BINDINGS).unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }));
        assert!(err.log().contains("@location(3)"));
    }

    #[test]
    fn mismatched_interface_type_fails_link() {
        let frag = "@fragment fn fs_main(@location(0) x: vec2<f32>) -> @location(0) vec4<f32> { return vec4<f32>(x, 0.0, 1.0); }";
        let err = check_link(&vs(PLAIN_VS), &fs(frag), &MESH_BINDINGS).unwrap_err();
        assert!(err.log().contains("@location(0)"));
    }

    #[test]
    fn binding_contract_violation_fails_link() {
        let vert = "
@group(0) @binding(1) var<storage, read> positions: array<i32>;
@vertex fn vs_main(@builtin(vertex_index) i: u32) -> @builtin(position) vec4<f32> {
    return vec4<f32>(f32(positions[i]));
}
";
        let err = check_link(&vs(vert), &fs(shaders::MESH_FRAGMENT_WGSL), &MESH_BINDINGS);
        // The fragment stage reads @location(0), which this vertex stage never writes.
        assert!(err.is_err());

        let frag = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        let err = check_link(&vs(vert), &fs(frag), &MESH_BINDINGS).unwrap_err();
        assert!(err.log().contains("vertex stage"), "{}", err.log());
        assert!(err.log().contains("positions"));
    }

    #[test]
    fn fragment_reading_mvp_fails_link() {
        let frag = "
@group(0) @binding(0) var<uniform> MVP: mat4x4<f32>;
struct FsIn { @location(0) local: vec3<f32> };
@fragment fn fs_main(frag: FsIn) -> @location(0) vec4<f32> { return MVP * vec4<f32>(frag.local, 1.0); }
";
        let err = check_link(&vs(shaders::MESH_VERTEX_WGSL), &fs(frag), &MESH_BINDINGS).unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }));
        assert!(err.log().contains("fragment stage"), "{}", err.log());
        assert!(err.log().contains("`MVP`"));
    }

    #[test]
    fn stages_must_be_in_order() {
        let a = vs(PLAIN_VS);
        let b = vs(PLAIN_VS);
        let err = check_link(&a, &b, &MESH_BINDINGS).unwrap_err();
        assert!(err.log().contains("expected a vertex and a fragment unit"));
    }

    #[test]
    fn linked_program_resolves_mvp() {
        let (device, _queue) = noop_device();
        let program = builtin_program(&device);
        let mvp = Some(UniformLocation { group: 0, binding: MVP_BINDING });
        assert_eq!(program.uniform_location(MVP_UNIFORM), mvp);
        assert_eq!(program.mvp_location(), mvp);
        assert_eq!(program.uniform_location("NotThere"), None);
    }

    #[test]
    fn invalid_location_upload_is_a_no_op() {
        let (device, queue) = noop_device();
        let program = builtin_program(&device);
        program.set_uniform_mat4(&queue, None, &Mat4::IDENTITY);
        program.set_uniform_mat4(&queue, Some(UniformLocation { group: 3, binding: 9 }), &Mat4::IDENTITY);
        program.set_uniform_mat4(&queue, program.mvp_location(), &Mat4::IDENTITY);
        queue.submit(std::iter::empty());
    }

    #[test]
    fn fragment_reading_mvp_is_refused_before_pipeline_creation() {
        let (device, _queue) = noop_device();
        let frag = "
@group(0) @binding(0) var<uniform> MVP: mat4x4<f32>;
@fragment fn fs_main(@location(0) local: vec3<f32>) -> @location(0) vec4<f32> { return MVP * vec4<f32>(local, 1.0); }
";
        let result = ShaderProgram::link(
            &device,
            &vs(shaders::MESH_VERTEX_WGSL),
            &fs(frag),
            MESH_BINDINGS,
            TARGETS,
        );
        assert!(matches!(result, Err(ShaderError::Link { .. })));
    }

    #[test]
    fn bind_group_accepts_matching_formats() {
        let (device, _queue) = noop_device();
        let program = builtin_program(&device);
        let positions = BufferTexture::from_positions(&device, "p", &[[0.0, 0.0, 0.0]; 3]);
        let triangles = BufferTexture::from_triangles(&device, "t", &[[0, 1, 2]]);
        program
            .bind_group(&device, &[(POSITIONS_UNIT, &positions), (TRIANGLES_UNIT, &triangles)])
            .unwrap();
    }

    #[test]
    fn bind_group_rejects_swapped_units() {
        let (device, _queue) = noop_device();
        let program = builtin_program(&device);
        let positions = BufferTexture::from_positions(&device, "p", &[[0.0, 0.0, 0.0]; 3]);
        let triangles = BufferTexture::from_triangles(&device, "t", &[[0, 1, 2]]);
        let err = program
            .bind_group(&device, &[(POSITIONS_UNIT, &triangles), (TRIANGLES_UNIT, &positions)])
            .unwrap_err();
        assert!(err.to_string().contains("expects Rgb32Float"), "{err}");
    }

    #[test]
    fn bind_group_requires_every_unit() {
        let (device, _queue) = noop_device();
        let program = builtin_program(&device);
        let positions = BufferTexture::from_positions(&device, "p", &[[0.0, 0.0, 0.0]]);
        let err = program
            .bind_group(&device, &[(POSITIONS_UNIT, &positions)])
            .unwrap_err();
        assert!(err.to_string().contains("unit 2"), "{err}");
    }
}
