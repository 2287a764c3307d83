use std::fmt;
use std::path::PathBuf;

use super::ShaderStage;

/// Upper bound on the diagnostic text kept from a failed compile or link.
pub const COMPILE_LOG_LIMIT: usize = 1024;

/// Failure while reading, compiling or linking shader code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// The source file could not be read.
    Read { path: PathBuf, message: String },
    /// A single stage failed to compile.
    Compile { stage: ShaderStage, log: String },
    /// The stages compiled but do not form a usable program.
    Link { log: String },
}

impl ShaderError {
    pub(crate) fn compile(stage: ShaderStage, log: impl Into<String>) -> Self {
        Self::Compile { stage, log: bounded_log(log.into()) }
    }

    pub(crate) fn link(log: impl Into<String>) -> Self {
        Self::Link { log: bounded_log(log.into()) }
    }

    /// Diagnostic text reported for the failure.
    pub fn log(&self) -> &str {
        match self {
            Self::Read { message, .. } => message,
            Self::Compile { log, .. } | Self::Link { log } => log,
        }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "can't read shader {}: {message}", path.display())
            }
            Self::Compile { stage, log } => {
                write!(f, "the {stage} shader failed to compile with the error:\n{log}")
            }
            Self::Link { log } => write!(f, "the shader program failed to link:\n{log}"),
        }
    }
}

impl std::error::Error for ShaderError {}

/// Truncates `log` to at most `COMPILE_LOG_LIMIT` bytes on a char boundary.
fn bounded_log(mut log: String) -> String {
    if log.len() > COMPILE_LOG_LIMIT {
        let mut end = COMPILE_LOG_LIMIT;
        while !log.is_char_boundary(end) {
            end -= 1;
        }
        log.truncate(end);
    }
    log
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_logs_are_bounded() {
        let err = ShaderError::compile(ShaderStage::Vertex, "x".repeat(5000));
        assert_eq!(err.log().len(), COMPILE_LOG_LIMIT);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 'é' is two bytes; 1023 ASCII bytes put it across the limit.
        let log = format!("{}é", "a".repeat(COMPILE_LOG_LIMIT - 1));
        let err = ShaderError::link(log);
        assert_eq!(err.log().len(), COMPILE_LOG_LIMIT - 1);
    }

    #[test]
    fn display_names_the_stage() {
        let err = ShaderError::compile(ShaderStage::Fragment, "bad token");
        assert!(err.to_string().contains("fragment shader failed to compile"));
    }
}
