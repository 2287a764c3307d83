//! CPU/GPU binding contract for the mesh pipeline.
//!
//! The vertex shader reads three resources: the `MVP` matrix and the two
//! buffer-textures. [`MESH_BINDINGS`] is the single description of where each
//! one lives. The bind-group layout is generated from it and every linked
//! program is checked against it, so a shader that moves a resource fails at
//! link time instead of rendering garbage.

use std::num::NonZeroU64;

use super::ShaderStage;
use crate::render::buffer_texture::ElementFormat;

/// Name of the model-view-projection uniform.
pub const MVP_UNIFORM: &str = "MVP";

/// Bind group all mesh resources live in.
pub const MESH_GROUP: u32 = 0;
pub const MVP_BINDING: u32 = 0;
/// Unit the position buffer-texture is bound to.
pub const POSITIONS_UNIT: u32 = 1;
/// Unit the triangle-index buffer-texture is bound to.
pub const TRIANGLES_UNIT: u32 = 2;

/// Size of a `mat4x4<f32>` uniform.
pub const MAT4_SIZE: u64 = 64;

/// Location of a uniform inside a linked program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation {
    pub group: u32,
    pub binding: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BindingKind {
    /// `var<uniform> NAME: mat4x4<f32>`
    UniformMat4,
    /// `var<storage, read> NAME: array<T>` read with the given element format.
    Texels(ElementFormat),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BindingSlot {
    pub name: &'static str,
    pub binding: u32,
    pub kind: BindingKind,
}

#[derive(Debug, Copy, Clone)]
pub struct BindingTable {
    pub group: u32,
    /// Stages the table's resources are visible to.
    pub stages: wgpu::ShaderStages,
    pub slots: &'static [BindingSlot],
}

pub const MESH_BINDINGS: BindingTable = BindingTable {
    group: MESH_GROUP,
    stages: wgpu::ShaderStages::VERTEX,
    slots: &[
        BindingSlot {
            name: MVP_UNIFORM,
            binding: MVP_BINDING,
            kind: BindingKind::UniformMat4,
        },
        BindingSlot {
            name: "positions",
            binding: POSITIONS_UNIT,
            kind: BindingKind::Texels(ElementFormat::Rgb32Float),
        },
        BindingSlot {
            name: "triangles",
            binding: TRIANGLES_UNIT,
            kind: BindingKind::Texels(ElementFormat::R32Sint),
        },
    ],
};

impl BindingTable {
    pub fn slot(&self, binding: u32) -> Option<&BindingSlot> {
        self.slots.iter().find(|s| s.binding == binding)
    }

    pub fn slot_named(&self, name: &str) -> Option<&BindingSlot> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Layout entries for the table's bind group.
    pub fn layout_entries(&self) -> Vec<wgpu::BindGroupLayoutEntry> {
        self.slots
            .iter()
            .map(|slot| {
                let (ty, min_size) = match slot.kind {
                    BindingKind::UniformMat4 => (wgpu::BufferBindingType::Uniform, MAT4_SIZE),
                    BindingKind::Texels(format) => (
                        wgpu::BufferBindingType::Storage { read_only: true },
                        format.element_size() as u64,
                    ),
                };
                wgpu::BindGroupLayoutEntry {
                    binding: slot.binding,
                    visibility: self.stages,
                    ty: wgpu::BindingType::Buffer {
                        ty,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(min_size),
                    },
                    count: None,
                }
            })
            .collect()
    }

    /// Rejects resources declared by a `stage` the table is not visible to.
    pub fn check_visibility(&self, stage: ShaderStage, module: &naga::Module) -> Result<(), String> {
        if self.stages.contains(stage.wgpu()) {
            return Ok(());
        }
        let bound = module
            .global_variables
            .iter()
            .find(|(_, var)| var.binding.is_some());
        match bound {
            Some((_, var)) => Err(format!(
                "`{}` is not visible to the {stage} stage",
                var.name.as_deref().unwrap_or("<unnamed>")
            )),
            None => Ok(()),
        }
    }

    /// Checks every resource `module` declares against the table.
    ///
    /// Slots the module does not use are fine; resources the table does not
    /// know, or that disagree with it on name, binding or layout, are not.
    pub fn validate(&self, module: &naga::Module) -> Result<(), String> {
        for (_, var) in module.global_variables.iter() {
            let Some(rb) = var.binding.as_ref() else { continue };
            let name = var.name.as_deref().unwrap_or("<unnamed>");

            if rb.group != self.group {
                return Err(format!(
                    "`{name}` is bound in group {}, expected group {}",
                    rb.group, self.group
                ));
            }
            let Some(slot) = self.slot(rb.binding) else {
                return Err(format!("`{name}` uses binding {} which is not assigned", rb.binding));
            };
            if slot.name != name {
                return Err(format!(
                    "binding {} is `{name}`, expected `{}`",
                    rb.binding, slot.name
                ));
            }
            check_kind(module, var, slot)?;
        }
        Ok(())
    }
}

fn check_kind(
    module: &naga::Module,
    var: &naga::GlobalVariable,
    slot: &BindingSlot,
) -> Result<(), String> {
    let inner = &module.types[var.ty].inner;
    match slot.kind {
        BindingKind::UniformMat4 => {
            let is_mat4 = matches!(
                inner,
                naga::TypeInner::Matrix {
                    columns: naga::VectorSize::Quad,
                    rows: naga::VectorSize::Quad,
                    scalar,
                } if *scalar == naga::Scalar::F32
            );
            if var.space != naga::AddressSpace::Uniform || !is_mat4 {
                return Err(format!("`{}` must be `var<uniform> {0}: mat4x4<f32>`", slot.name));
            }
        }
        BindingKind::Texels(format) => {
            let read_only = matches!(
                var.space,
                naga::AddressSpace::Storage { access } if !access.contains(naga::StorageAccess::STORE)
            );
            let element_ok = match inner {
                naga::TypeInner::Array { base, size: naga::ArraySize::Dynamic, .. } => {
                    module.types[*base].inner == naga::TypeInner::Scalar(format.wgsl_scalar())
                }
                _ => false,
            };
            if !read_only || !element_ok {
                return Err(format!(
                    "`{}` must be `var<storage, read> {0}: array<{}>` for {format:?} data",
                    slot.name,
                    wgsl_scalar_name(format),
                ));
            }
        }
    }
    Ok(())
}

fn wgsl_scalar_name(format: ElementFormat) -> &'static str {
    match format {
        ElementFormat::Rgb32Float => "f32",
        ElementFormat::R32Sint => "i32",
    }
}

/// Finds the uniform called `name` in `module`.
pub(crate) fn find_uniform(module: &naga::Module, name: &str) -> Option<UniformLocation> {
    module.global_variables.iter().find_map(|(_, var)| {
        let rb = var.binding.as_ref()?;
        (var.space == naga::AddressSpace::Uniform && var.name.as_deref() == Some(name)).then_some(
            UniformLocation {
                group: rb.group,
                binding: rb.binding,
            },
        )
    })
}
