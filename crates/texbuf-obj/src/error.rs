use std::fmt;
use std::path::PathBuf;

/// Errors produced while reading a model file.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjError {
    /// The file could not be opened or read.
    Io {
        path: PathBuf,
        kind: std::io::ErrorKind,
        message: String,
    },
    /// A `v` or `f` marker was not followed by three usable numbers.
    Malformed {
        /// 1-based line of the offending token (or of the marker at end of input).
        line: usize,
        message: String,
    },
}

impl ObjError {
    pub(crate) fn malformed(msg: impl Into<String>, line: usize) -> Self {
        Self::Malformed { line, message: msg.into() }
    }

    /// Returns `true` if the error is a missing/unreadable file.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

impl fmt::Display for ObjError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message, .. } => {
                write!(f, "can't read model file {}: {message}", path.display())
            }
            Self::Malformed { line, message } => {
                write!(f, "obj parse error at line {line}: {message}")
            }
        }
    }
}

impl std::error::Error for ObjError {}
