//! Shader unit compilation and program linking.
//!
//! Lifecycle: [`read_source`] → [`CompiledUnit::compile`] (one per stage) →
//! [`ShaderProgram::link`]. Every step reports failure as a [`ShaderError`]
//! and logs the diagnostic; whether that is fatal is the caller's call.

pub mod bindings;
mod error;
mod program;
mod unit;

pub use bindings::{BindingKind, BindingSlot, BindingTable, UniformLocation, MESH_BINDINGS};
pub use error::{ShaderError, COMPILE_LOG_LIMIT};
pub use program::{check_link, ProgramTargets, ShaderProgram};
pub use unit::{read_source, CompiledUnit, ShaderStage};
