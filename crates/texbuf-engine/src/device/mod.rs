//! GPU device and presentation surface.
//!
//! [`Gpu`] owns the device, queue and swapchain of the single viewer window.
//! Adapters that cannot read storage buffers from the vertex stage are
//! rejected up front, since every mesh is fetched that way.

mod capability;
mod context;
mod frame;
mod init;
mod surface;

pub use capability::{check_buffer_texture_support, CapabilityError, REQUIRED_VERTEX_STORAGE_BUFFERS};
pub use context::Gpu;
pub use frame::{Acquire, GpuFrame};
pub use init::GpuInit;
