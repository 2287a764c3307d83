//! texbuf engine crate.
//!
//! Owns the platform + GPU runtime and the buffer-texture mesh pipeline:
//! geometry is uploaded into plain GPU buffers and fetched by index from the
//! vertex stage instead of being streamed through vertex attributes.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod camera;
pub mod render;
