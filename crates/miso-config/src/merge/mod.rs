//! Config file discovery and environment overrides

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use miso_core::error::MisoError;
use tracing::debug;

use crate::toml::{load_from_file, validate_config, MisoConfig};
use crate::ConfigResult;

/// File name looked up in every search directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Directories searched after any explicitly requested ones
pub const DEFAULT_CONFIG_DIRS: [&str; 2] = ["/app/config", "./config"];

const ENV_PREFIX: &str = "MISO_";

/// Main configuration loading interface
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Directories searched for config.toml, in priority order
    search_dirs: Vec<Utf8PathBuf>,
}

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// config.toml found at this path
    File(Utf8PathBuf),
    /// File values overridden by these environment variables
    FileWithEnvironment(Utf8PathBuf, Vec<String>),
}

impl ConfigLoader {
    /// Loader searching `extra_dirs` first, then the default directories
    pub fn new<I, P>(extra_dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        let mut search_dirs: Vec<Utf8PathBuf> = extra_dirs.into_iter().map(Into::into).collect();
        search_dirs.extend(DEFAULT_CONFIG_DIRS.iter().map(Utf8PathBuf::from));
        Self { search_dirs }
    }

    /// Loader restricted to exactly these directories
    pub fn with_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        Self {
            search_dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn search_dirs(&self) -> &[Utf8PathBuf] {
        &self.search_dirs
    }

    /// First existing config.toml in the search directories
    pub fn resolve_config_path(&self) -> ConfigResult<Utf8PathBuf> {
        for dir in &self.search_dirs {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        Err(MisoError::ConfigNotFound {
            searched: self
                .search_dirs
                .iter()
                .map(|dir| dir.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// Load, override from the process environment, and validate
    pub async fn load(&self) -> ConfigResult<(MisoConfig, ConfigSource)> {
        let env: HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect();
        self.load_with_env(&env).await
    }

    /// Same as [`ConfigLoader::load`] with an explicit environment
    pub async fn load_with_env(
        &self,
        env: &HashMap<String, String>,
    ) -> ConfigResult<(MisoConfig, ConfigSource)> {
        let path = self.resolve_config_path()?;
        debug!(path = %path, "loading configuration");

        let mut config = load_from_file(&path).await?;
        let applied = apply_env_overrides(&mut config, env)?;
        validate_config(&config).map_err(|e| in_file(&path, e))?;

        let source = if applied.is_empty() {
            ConfigSource::File(path)
        } else {
            ConfigSource::FileWithEnvironment(path, applied)
        };
        Ok((config, source))
    }
}

fn in_file(path: &Utf8Path, error: MisoError) -> MisoError {
    match error {
        MisoError::ConfigValidation { field, reason } => MisoError::ConfigValidation {
            field,
            reason: format!("{} (in {})", reason, path),
        },
        other => other,
    }
}

/// Apply `MISO_*` environment overrides, returning the variables used
pub fn apply_env_overrides(
    config: &mut MisoConfig,
    overrides: &HashMap<String, String>,
) -> ConfigResult<Vec<String>> {
    let mut applied = Vec::new();

    for (key, value) in overrides {
        match key.as_str() {
            "MISO_APP_HOST" => {
                config.app.host = value.clone();
            }
            "MISO_APP_PORT" => {
                config.app.port = parse_port(key, value)?;
            }
            "MISO_LOG_LEVEL" => {
                config.app.log_level = value.clone();
            }
            "MISO_HEALTH_PORT" => {
                config.health.port = parse_port(key, value)?;
            }
            "MISO_S3_BUCKET" => {
                config.s3.bucket = value.clone();
            }
            "MISO_S3_REGION" => {
                config.s3.region = Some(value.clone());
            }
            "MISO_S3_ENDPOINT" => {
                config.s3.endpoint = Some(value.clone());
            }
            "MISO_DOWNLOAD_MODE" => {
                config.s3.download_mode = value.parse().map_err(|_| {
                    MisoError::config_validation(
                        key.as_str(),
                        format!("expected 'presigned-url' or 'proxy', got '{}'", value),
                    )
                })?;
            }
            _ => {
                // Unknown environment variable, ignore
                continue;
            }
        }
        applied.push(key.clone());
    }

    applied.sort();
    Ok(applied)
}

fn parse_port(key: &str, value: &str) -> ConfigResult<u16> {
    value
        .parse()
        .map_err(|e| MisoError::config_validation(key, format!("invalid port '{}': {}", value, e)))
}
