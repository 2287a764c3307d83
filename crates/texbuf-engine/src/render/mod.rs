//! GPU rendering subsystem.
//!
//! The mesh pipeline draws without vertex buffers. Positions and triangle
//! indices are uploaded as [`BufferTexture`]s and the vertex shader fetches
//! both by index. [`RenderContext`] owns the whole pipeline state.

pub mod buffer_texture;
mod context;
mod ctx;
pub mod shader;
pub mod shaders;
#[cfg(test)]
pub(crate) mod testing;

pub use buffer_texture::{BufferTexture, ElementFormat, TexelView};
pub use context::{draw_range, RenderContext, CLEAR_COLOR, DEPTH_FORMAT};
pub use ctx::{RenderCtx, RenderTarget};
