//! Configuration, paths, errors and logging for the guest list tools.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_LOG_LEVEL, DEFAULT_OPTIONS, DEFAULT_SYNC_TIMEOUT_MS};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
