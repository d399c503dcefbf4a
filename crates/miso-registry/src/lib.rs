//! Terraform registry protocol handlers for miso
//!
//! This crate maps the registry protocol onto object storage: registry paths
//! become storage key prefixes, listed keys become version lists, and
//! downloads are served either as presigned URLs or as proxied streams.

pub mod api;
pub mod handler;
pub mod metrics;
pub mod routes;

// Re-export main types
pub use api::{
    ErrorResponse, ModuleVersions, ModuleVersionsResponse, ProviderDownloadResponse,
    ProviderVersionsResponse, ServiceDiscovery, VersionEntry,
};
pub use handler::{Download, RegistryHandler};
pub use metrics::Metrics;
pub use routes::{app, health_router, registry_routes, ApiError, API_PREFIX};

use miso_core::error::MisoError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, MisoError>;
