//! Registry protocol operations over a [`Storage`] backend
//!
//! Listings derive a key prefix from the identity tuple and aggregate the
//! listed keys into a [`VersionSet`]. Downloads build the exact artifact key
//! and resolve it according to the configured [`DownloadMode`]; no existence
//! check is made first.

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use miso_core::types::{
    DownloadMode, ModuleAddress, ProviderAddress, ProviderPlatform, StorageKey, VersionSet,
};
use miso_storage::{ObjectStream, Storage};
use tracing::debug;

use crate::api::{ModuleVersionsResponse, ProviderDownloadResponse, ProviderVersionsResponse};
use crate::RegistryResult;

/// Stateless registry operations, cloned into every request
#[derive(Clone)]
pub struct RegistryHandler {
    storage: Arc<dyn Storage>,
    download_mode: DownloadMode,
}

/// Resolved artifact download
pub enum Download {
    /// Signed URL pointing straight into the bucket
    PresignedUrl(String),
    /// Open object stream, relayed through the registry
    Proxy(ObjectStream),
}

impl RegistryHandler {
    pub fn new(storage: Arc<dyn Storage>, download_mode: DownloadMode) -> Self {
        Self {
            storage,
            download_mode,
        }
    }

    pub fn download_mode(&self) -> DownloadMode {
        self.download_mode
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// All stored versions of a provider
    pub async fn list_provider_versions(
        &self,
        provider: &ProviderAddress,
    ) -> RegistryResult<ProviderVersionsResponse> {
        let versions = self.versions_under(&provider.versions_prefix()).await?;
        Ok(versions.into())
    }

    /// All stored versions of a module
    pub async fn list_module_versions(
        &self,
        module: &ModuleAddress,
    ) -> RegistryResult<ModuleVersionsResponse> {
        let versions = self.versions_under(&module.versions_prefix()).await?;
        Ok(versions.into())
    }

    /// Resolve the provider binary for one version and platform
    pub async fn download_provider_version(
        &self,
        provider: &ProviderAddress,
        version: &str,
        platform: &ProviderPlatform,
    ) -> RegistryResult<Download> {
        self.resolve(provider.binary_key(version, platform)).await
    }

    /// Resolve the module archive for one version
    pub async fn download_module_version(
        &self,
        module: &ModuleAddress,
        version: &str,
    ) -> RegistryResult<Download> {
        self.resolve(module.archive_key(version)).await
    }

    async fn versions_under(&self, prefix: &str) -> RegistryResult<VersionSet> {
        let keys = self.storage.list(prefix).await?;
        let versions = VersionSet::from_keys(prefix, &keys);
        debug!(prefix, keys = keys.len(), versions = versions.len(), "listed versions");
        Ok(versions)
    }

    async fn resolve(&self, key: StorageKey) -> RegistryResult<Download> {
        debug!(key = %key, mode = %self.download_mode, "resolving download");
        match self.download_mode {
            DownloadMode::PresignedUrl => {
                let url = self.storage.presigned_url(key.as_str()).await?;
                Ok(Download::PresignedUrl(url))
            }
            DownloadMode::Proxy => {
                let stream = self.storage.get_stream(key.as_str()).await?;
                Ok(Download::Proxy(stream))
            }
        }
    }
}

impl fmt::Debug for RegistryHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryHandler")
            .field("storage", &self.storage.name())
            .field("download_mode", &self.download_mode)
            .finish()
    }
}

impl Download {
    /// Provider protocol: JSON `download_url` body, or the raw bytes
    pub fn into_provider_response(self) -> Response {
        match self {
            Download::PresignedUrl(download_url) => {
                Json(ProviderDownloadResponse { download_url }).into_response()
            }
            Download::Proxy(stream) => proxy_response(stream),
        }
    }

    /// Module protocol: `302 Found` to the signed URL, or the raw bytes
    pub fn into_module_response(self) -> Response {
        match self {
            Download::PresignedUrl(url) => (StatusCode::FOUND, [(header::LOCATION, url)]).into_response(),
            Download::Proxy(stream) => proxy_response(stream),
        }
    }
}

/// The stream moves into the body, which drops it (and the read handle)
/// when the copy finishes, fails, or the client goes away.
fn proxy_response(stream: ObjectStream) -> Response {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        )],
        Body::from_stream(stream),
    )
        .into_response()
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Download::PresignedUrl(url) => f.debug_tuple("PresignedUrl").field(url).finish(),
            Download::Proxy(_) => f.write_str("Proxy(..)"),
        }
    }
}
