//! Camera and per-frame transform.

mod orbit;

pub use orbit::{CameraConfig, OrbitCamera};
