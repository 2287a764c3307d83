//! Built-in WGSL for the mesh pipeline, used when no shader files are given.

pub const MESH_VERTEX_WGSL: &str = include_str!("mesh.vert.wgsl");
pub const MESH_FRAGMENT_WGSL: &str = include_str!("mesh.frag.wgsl");
