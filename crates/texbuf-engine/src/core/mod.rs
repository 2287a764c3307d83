//! Core engine-facing contracts.
//!
//! The interface between the platform loop and the application: an [`App`]
//! receives one [`FrameCtx`] per redraw.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
