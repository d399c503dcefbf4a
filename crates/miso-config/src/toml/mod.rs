//! config.toml schema, parsing and validation

use std::time::Duration;

use camino::Utf8Path;
use miso_core::error::MisoError;
use miso_core::types::DownloadMode;
use serde::{Deserialize, Serialize};

use crate::ConfigResult;

/// Longest lifetime S3 accepts for a presigned URL (7 days)
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete config.toml configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MisoConfig {
    /// Main registry server
    #[serde(default)]
    pub app: AppSection,

    /// Health server (`metrics` is accepted as an alias)
    #[serde(default, alias = "metrics")]
    pub health: HealthSection,

    /// Backing bucket
    pub s3: S3Section,
}

/// Main server section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    /// Bind address
    pub host: String,

    /// Registry API port
    pub port: u16,

    /// Minimum log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Health server section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSection {
    /// Port of the health endpoint, bound on `app.host`
    pub port: u16,
}

/// Object storage section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Section {
    /// Bucket holding `providers/` and `modules/`
    pub bucket: String,

    /// AWS region; falls back to the SDK provider chain when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible stores (MinIO, R2, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Use path-style addressing (`endpoint/bucket/key`)
    #[serde(default)]
    pub force_path_style: bool,

    /// How downloads are served
    #[serde(default)]
    pub download_mode: DownloadMode,

    /// Lifetime of presigned download URLs, in seconds
    #[serde(default = "default_presign_expiry_secs")]
    pub presign_expiry_secs: u64,

    /// Per-request timeout against the store, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

fn default_presign_expiry_secs() -> u64 {
    900
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl Default for HealthSection {
    fn default() -> Self {
        Self { port: 8081 }
    }
}

impl AppSection {
    /// `host:port` of the registry server
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl MisoConfig {
    /// `host:port` of the health server
    pub fn health_addr(&self) -> String {
        format!("{}:{}", self.app.host, self.health.port)
    }
}

impl S3Section {
    /// Section for `bucket` with every other field defaulted
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: None,
            endpoint: None,
            force_path_style: false,
            download_mode: DownloadMode::default(),
            presign_expiry_secs: default_presign_expiry_secs(),
            request_timeout_secs: None,
        }
    }

    pub fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.presign_expiry_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Parse TOML string to MisoConfig configuration
///
/// Validation is left to the caller so that environment overrides can be
/// applied first.
pub fn parse_config(content: &str) -> ConfigResult<MisoConfig> {
    ::toml::from_str(content).map_err(|e| MisoError::TomlParse {
        path: "config.toml".to_string(),
        message: e.message().to_string(),
    })
}

/// Serialize MisoConfig to TOML string
pub fn serialize_config(config: &MisoConfig) -> ConfigResult<String> {
    ::toml::to_string_pretty(config).map_err(|e| MisoError::TomlParse {
        path: "config.toml".to_string(),
        message: format!("serialization error: {}", e),
    })
}

/// Validate configuration completeness
pub fn validate_config(config: &MisoConfig) -> ConfigResult<()> {
    if config.s3.bucket.trim().is_empty() {
        return Err(MisoError::config_validation(
            "s3.bucket",
            "a bucket name is required",
        ));
    }

    if config.s3.presign_expiry_secs == 0 || config.s3.presign_expiry_secs > MAX_PRESIGN_EXPIRY_SECS {
        return Err(MisoError::config_validation(
            "s3.presign_expiry_secs",
            format!(
                "must be between 1 and {} seconds, got {}",
                MAX_PRESIGN_EXPIRY_SECS, config.s3.presign_expiry_secs
            ),
        ));
    }

    if config.s3.request_timeout_secs == Some(0) {
        return Err(MisoError::config_validation(
            "s3.request_timeout_secs",
            "must be greater than zero when set",
        ));
    }

    if let Some(endpoint) = &config.s3.endpoint {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(MisoError::config_validation(
                "s3.endpoint",
                format!("'{}' is not an http(s) URL", endpoint),
            ));
        }
    }

    let level = config.app.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(MisoError::config_validation(
            "app.log_level",
            format!("expected one of {}, got '{}'", LOG_LEVELS.join(", "), config.app.log_level),
        ));
    }

    if config.app.port == config.health.port {
        return Err(MisoError::config_validation(
            "health.port",
            format!("must differ from app.port ({})", config.app.port),
        ));
    }

    Ok(())
}

/// Load and parse config.toml from file path
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<MisoConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MisoError::io(format!("Failed to read {}", path), e))?;

    parse_config(&content).map_err(|e| match e {
        MisoError::TomlParse { message, .. } => MisoError::TomlParse {
            path: path.to_string(),
            message,
        },
        other => other,
    })
}
