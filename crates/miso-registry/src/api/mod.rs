//! Terraform registry protocol response types

use miso_core::types::VersionSet;
use serde::{Deserialize, Serialize};

/// One available version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct VersionEntry {
    pub version: String,
}

/// `GET /providers/{namespace}/{type}/versions`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderVersionsResponse {
    pub versions: Vec<VersionEntry>,
}

/// Versions of a single module
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModuleVersions {
    pub versions: Vec<VersionEntry>,
}

/// `GET /modules/{namespace}/{name}/{provider}/versions`
///
/// The protocol wraps the versions in a one-element `modules` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModuleVersionsResponse {
    pub modules: Vec<ModuleVersions>,
}

/// Provider download answer in presigned-url mode
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderDownloadResponse {
    pub download_url: String,
}

/// `/.well-known/terraform.json` service discovery document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceDiscovery {
    #[serde(rename = "modules.v1")]
    pub modules: String,
    #[serde(rename = "providers.v1")]
    pub providers: String,
}

/// Registry error body
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub errors: Vec<String>,
}

fn entries(versions: VersionSet) -> Vec<VersionEntry> {
    versions
        .into_iter()
        .map(|version| VersionEntry { version })
        .collect()
}

impl From<VersionSet> for ProviderVersionsResponse {
    fn from(versions: VersionSet) -> Self {
        Self {
            versions: entries(versions),
        }
    }
}

impl From<VersionSet> for ModuleVersionsResponse {
    fn from(versions: VersionSet) -> Self {
        Self {
            modules: vec![ModuleVersions {
                versions: entries(versions),
            }],
        }
    }
}

impl ServiceDiscovery {
    /// Discovery document for an API mounted under `api_prefix`
    pub fn for_prefix(api_prefix: &str) -> Self {
        Self {
            modules: format!("{}/modules/", api_prefix),
            providers: format!("{}/providers/", api_prefix),
        }
    }
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }
}
