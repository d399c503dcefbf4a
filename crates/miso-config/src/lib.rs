//! Configuration loading for the miso registry
//!
//! This crate handles discovery, parsing and validation of `config.toml`,
//! layering `MISO_*` environment overrides on top of the file.

pub mod toml;
pub mod merge;

// Re-export main types
pub use self::toml::{AppSection, HealthSection, LogFormat, MisoConfig, S3Section};
pub use merge::{ConfigLoader, ConfigSource, CONFIG_FILE_NAME, DEFAULT_CONFIG_DIRS};

use miso_core::error::MisoError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, MisoError>;
