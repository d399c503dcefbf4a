//! Registry identity tuples.
//!
//! Providers and modules are addressed purely by path parameters. Nothing is
//! persisted locally: each address maps onto a key prefix in the object store,
//! and every stored version lives one segment below that prefix.

use serde::{Deserialize, Serialize};

use super::StorageKey;

/// Top-level key segment for provider binaries
pub const PROVIDERS_ROOT: &str = "providers";
/// Top-level key segment for module archives
pub const MODULES_ROOT: &str = "modules";
/// File name of every stored module archive
pub const MODULE_ARCHIVE: &str = "module.zip";

/// Provider identity (`{namespace}/{type}`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderAddress {
    pub namespace: String,
    #[serde(rename = "type")]
    pub provider_type: String,
}

/// Target platform of a provider binary
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderPlatform {
    pub os: String,
    pub arch: String,
}

/// Module identity (`{namespace}/{name}/{provider}`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleAddress {
    pub namespace: String,
    pub name: String,
    pub provider: String,
}

impl ProviderAddress {
    pub fn new(namespace: impl Into<String>, provider_type: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            provider_type: provider_type.into(),
        }
    }

    /// Prefix under which every version of this provider is stored
    pub fn versions_prefix(&self) -> String {
        format!(
            "{}/{}/{}/",
            PROVIDERS_ROOT, self.namespace, self.provider_type
        )
    }

    /// Binary file name, e.g. `terraform-provider-aws_v5.0.0`
    pub fn binary_name(&self, version: &str) -> String {
        format!("terraform-provider-{}_v{}", self.provider_type, version)
    }

    /// Exact key of the binary for one version and platform
    pub fn binary_key(&self, version: &str, platform: &ProviderPlatform) -> StorageKey {
        StorageKey::from_segments([
            PROVIDERS_ROOT,
            self.namespace.as_str(),
            self.provider_type.as_str(),
            version,
            platform.os.as_str(),
            platform.arch.as_str(),
            self.binary_name(version).as_str(),
        ])
    }
}

impl ProviderPlatform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }
}

impl ModuleAddress {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            provider: provider.into(),
        }
    }

    /// Prefix under which every version of this module is stored
    pub fn versions_prefix(&self) -> String {
        format!(
            "{}/{}/{}/{}/",
            MODULES_ROOT, self.namespace, self.name, self.provider
        )
    }

    /// Exact key of the archive for one version
    pub fn archive_key(&self, version: &str) -> StorageKey {
        StorageKey::from_segments([
            MODULES_ROOT,
            self.namespace.as_str(),
            self.name.as_str(),
            self.provider.as_str(),
            version,
            MODULE_ARCHIVE,
        ])
    }
}
