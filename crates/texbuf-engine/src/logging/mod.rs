//! Logger setup. The rest of the workspace logs through the `log` facade.

mod init;

pub use init::{init_logging, resolve_filter, LoggingConfig, DEFAULT_FILTER};
