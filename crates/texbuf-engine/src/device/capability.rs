use std::fmt;

/// Storage buffers the mesh vertex stage binds: positions and triangles.
pub const REQUIRED_VERTEX_STORAGE_BUFFERS: u32 = 2;

/// Why an adapter cannot run the buffer-texture pipeline.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CapabilityError {
    /// The vertex stage cannot read storage buffers at all (WebGL2 and some
    /// GLES drivers).
    NoVertexStorage { adapter: String },
    /// Fewer storage buffer slots per stage than the mesh pipeline binds.
    TooFewStorageBuffers { adapter: String, available: u32 },
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityError::NoVertexStorage { adapter } => {
                write!(f, "adapter `{adapter}` cannot read storage buffers from the vertex stage")
            }
            CapabilityError::TooFewStorageBuffers { adapter, available } => write!(
                f,
                "adapter `{adapter}` allows {available} storage buffers per stage, \
                 {REQUIRED_VERTEX_STORAGE_BUFFERS} are needed"
            ),
        }
    }
}

impl std::error::Error for CapabilityError {}

/// Checks that an adapter can fetch geometry from buffer-textures.
pub fn check_buffer_texture_support(
    adapter: &str,
    downlevel: &wgpu::DownlevelCapabilities,
    limits: &wgpu::Limits,
) -> Result<(), CapabilityError> {
    if !downlevel.flags.contains(wgpu::DownlevelFlags::VERTEX_STORAGE) {
        return Err(CapabilityError::NoVertexStorage {
            adapter: adapter.to_string(),
        });
    }
    if limits.max_storage_buffers_per_shader_stage < REQUIRED_VERTEX_STORAGE_BUFFERS {
        return Err(CapabilityError::TooFewStorageBuffers {
            adapter: adapter.to_string(),
            available: limits.max_storage_buffers_per_shader_stage,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_defaults_are_enough() {
        let downlevel = wgpu::DownlevelCapabilities::default();
        check_buffer_texture_support("test", &downlevel, &wgpu::Limits::default()).unwrap();
    }

    #[test]
    fn webgl2_lacks_vertex_storage() {
        let downlevel = wgpu::DownlevelCapabilities {
            flags: wgpu::DownlevelFlags::empty(),
            ..Default::default()
        };
        let err = check_buffer_texture_support("gl", &downlevel, &wgpu::Limits::downlevel_webgl2_defaults())
            .unwrap_err();
        assert_eq!(
            err,
            CapabilityError::NoVertexStorage {
                adapter: "gl".to_string()
            }
        );
    }

    #[test]
    fn one_storage_slot_is_too_few() {
        let limits = wgpu::Limits {
            max_storage_buffers_per_shader_stage: 1,
            ..Default::default()
        };
        let err = check_buffer_texture_support("tiny", &wgpu::DownlevelCapabilities::default(), &limits)
            .unwrap_err();
        assert!(err.to_string().contains("allows 1 storage buffers"));
    }
}
