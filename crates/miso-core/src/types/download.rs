//! Download strategy selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MisoError;

/// How artifact downloads are served
///
/// `PresignedUrl` hands the client a time-limited URL straight into the
/// bucket; `Proxy` streams the object bytes through the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DownloadMode {
    #[default]
    PresignedUrl,
    Proxy,
}

impl DownloadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadMode::PresignedUrl => "presigned-url",
            DownloadMode::Proxy => "proxy",
        }
    }
}

impl fmt::Display for DownloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadMode {
    type Err = MisoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "presigned-url" => Ok(DownloadMode::PresignedUrl),
            "proxy" => Ok(DownloadMode::Proxy),
            other => Err(MisoError::config_validation(
                "download_mode",
                format!("expected 'presigned-url' or 'proxy', got '{}'", other),
            )),
        }
    }
}
