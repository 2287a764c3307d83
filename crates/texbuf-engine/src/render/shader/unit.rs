use std::fmt;
use std::path::Path;

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::ShaderError;

/// Pipeline stage a shader unit is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub(crate) fn naga(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }

    pub fn wgpu(self) -> wgpu::ShaderStages {
        match self {
            Self::Vertex => wgpu::ShaderStages::VERTEX,
            Self::Fragment => wgpu::ShaderStages::FRAGMENT,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// Reads a whole WGSL file. No preprocessing, no include resolution.
pub fn read_source(path: impl AsRef<Path>) -> Result<String, ShaderError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|e| {
        let err = ShaderError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        log::error!("{err}");
        err
    })
}

/// One successfully compiled shader stage.
///
/// Holds the validated IR for reflection at link time and the source text the
/// GPU module is created from. A unit that fails to compile is never
/// constructed; its partial state is dropped inside [`CompiledUnit::compile`].
#[derive(Debug)]
pub struct CompiledUnit {
    stage: ShaderStage,
    label: String,
    source: String,
    module: naga::Module,
    /// Index into `module.entry_points`.
    entry: usize,
}

impl CompiledUnit {
    /// Parses and validates `source` as a `stage` shader.
    ///
    /// On failure the diagnostic (at most [`super::COMPILE_LOG_LIMIT`] bytes)
    /// is logged and returned in [`ShaderError::Compile`].
    pub fn compile(
        label: impl Into<String>,
        source: impl Into<String>,
        stage: ShaderStage,
    ) -> Result<Self, ShaderError> {
        let label = label.into();
        let source = source.into();

        let result = Self::check(&source, stage);
        let (module, entry) = match result {
            Ok(ok) => ok,
            Err(err) => {
                log::error!("`{label}`: {err}");
                return Err(err);
            }
        };

        log::debug!(
            "compiled {stage} shader `{label}` (entry point `{}`)",
            module.entry_points[entry].name
        );

        Ok(Self {
            stage,
            label,
            source,
            module,
            entry,
        })
    }

    fn check(source: &str, stage: ShaderStage) -> Result<(naga::Module, usize), ShaderError> {
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|e| ShaderError::compile(stage, e.emit_to_string(source)))?;

        Validator::new(ValidationFlags::all(), Capabilities::default())
            .validate(&module)
            .map_err(|e| ShaderError::compile(stage, e.emit_to_string(source)))?;

        let entry = module
            .entry_points
            .iter()
            .position(|ep| ep.stage == stage.naga())
            .ok_or_else(|| ShaderError::compile(stage, format!("no @{stage} entry point")))?;

        Ok((module, entry))
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn entry_point(&self) -> &str {
        &self.entry().name
    }

    pub(crate) fn module(&self) -> &naga::Module {
        &self.module
    }

    pub(crate) fn entry(&self) -> &naga::EntryPoint {
        &self.module.entry_points[self.entry]
    }

    pub(crate) fn create_module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&self.label),
            source: wgpu::ShaderSource::Wgsl(self.source.as_str().into()),
        })
    }
}
