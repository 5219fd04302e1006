//! Configuration, paths and logging for the getit server and client.
//!
//! This crate provides:
//! - File system paths for the store, temp, log and config files
//! - Configuration loading (config file + environment overrides)
//! - Logging initialization

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_LOG_LEVEL, DEFAULT_PORT};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
pub use paths::Paths;
