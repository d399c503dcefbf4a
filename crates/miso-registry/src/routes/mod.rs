//! HTTP surface of the registry
//!
//! ```text
//! /
//! ├── /.well-known/terraform.json          - service discovery
//! └── /v1
//!     ├── /providers/{namespace}/{type}/versions
//!     ├── /providers/{namespace}/{type}/{version}/download/{os}/{arch}
//!     ├── /modules/{namespace}/{name}/{provider}/versions
//!     ├── /modules/{namespace}/{name}/{provider}/{version}/download
//!     └── /mirror/health
//! ```
//!
//! The liveness endpoint and `/metrics` are served by a separate
//! [`health_router`] bound to its own port.

use std::time::Instant;

use axum::extract::{Path, Request, State};
use axum::http::{header, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use miso_core::error::MisoError;
use miso_core::types::{ModuleAddress, ProviderAddress, ProviderPlatform};
use serde::Deserialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::api::{ErrorResponse, ModuleVersionsResponse, ProviderVersionsResponse, ServiceDiscovery};
use crate::handler::RegistryHandler;
use crate::metrics::{self, Metrics};

/// Mount point of the registry API, advertised through service discovery
pub const API_PREFIX: &str = "/v1";

/// Failure surfaced to a registry client
///
/// Every storage failure becomes a generic 500; the detail is only logged.
#[derive(Debug)]
pub struct ApiError(pub MisoError);

impl From<MisoError> for ApiError {
    fn from(err: MisoError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "registry request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("internal server error")),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ProviderDownloadPath {
    namespace: String,
    #[serde(rename = "type")]
    provider_type: String,
    version: String,
    os: String,
    arch: String,
}

#[derive(Debug, Deserialize)]
struct ModuleDownloadPath {
    namespace: String,
    name: String,
    provider: String,
    version: String,
}

/// Registry protocol routes, relative to [`API_PREFIX`]
pub fn registry_routes(handler: RegistryHandler) -> Router {
    Router::new()
        .route("/providers/{namespace}/{type}/versions", get(provider_versions))
        .route(
            "/providers/{namespace}/{type}/{version}/download/{os}/{arch}",
            get(provider_download),
        )
        .route("/modules/{namespace}/{name}/{provider}/versions", get(module_versions))
        .route(
            "/modules/{namespace}/{name}/{provider}/{version}/download",
            get(module_download),
        )
        .route("/mirror/health", get(healthy))
        .with_state(handler)
}

/// Complete registry application: discovery, the versioned API and the
/// request middleware stack
pub fn app(handler: RegistryHandler, metrics: Metrics) -> Router {
    let router = Router::new()
        .route("/", get(healthy))
        .route("/.well-known/terraform.json", get(discovery))
        .nest(API_PREFIX, registry_routes(handler));
    guarded(router)
        .layer(middleware::from_fn_with_state(metrics, metrics::observe_requests))
        .layer(cors())
}

/// Liveness and Prometheus scrape endpoints for the secondary listener
///
/// Requests here are logged but not counted.
pub fn health_router(metrics: Metrics) -> Router {
    guarded(
        Router::new()
            .route("/health", get(healthy))
            .route("/metrics", get(metrics::scrape))
            .with_state(metrics),
    )
}

/// Panics become 500 responses and every request is logged
fn guarded(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn(log_requests))
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
}

/// One log line per request; server errors are logged at error level
async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        error!(%method, %uri, status, latency_ms, "REQUEST_ERROR");
    } else {
        info!(%method, %uri, status, latency_ms, "REQUEST");
    }

    response
}

async fn healthy() -> Json<bool> {
    Json(true)
}

async fn discovery() -> Json<ServiceDiscovery> {
    Json(ServiceDiscovery::for_prefix(API_PREFIX))
}

async fn provider_versions(
    State(registry): State<RegistryHandler>,
    Path(provider): Path<ProviderAddress>,
) -> Result<Json<ProviderVersionsResponse>, ApiError> {
    Ok(Json(registry.list_provider_versions(&provider).await?))
}

async fn provider_download(
    State(registry): State<RegistryHandler>,
    Path(path): Path<ProviderDownloadPath>,
) -> Result<Response, ApiError> {
    let provider = ProviderAddress::new(path.namespace, path.provider_type);
    let platform = ProviderPlatform::new(path.os, path.arch);
    let download = registry
        .download_provider_version(&provider, &path.version, &platform)
        .await?;
    Ok(download.into_provider_response())
}

async fn module_versions(
    State(registry): State<RegistryHandler>,
    Path(module): Path<ModuleAddress>,
) -> Result<Json<ModuleVersionsResponse>, ApiError> {
    Ok(Json(registry.list_module_versions(&module).await?))
}

async fn module_download(
    State(registry): State<RegistryHandler>,
    Path(path): Path<ModuleDownloadPath>,
) -> Result<Response, ApiError> {
    let module = ModuleAddress::new(path.namespace, path.name, path.provider);
    let download = registry.download_module_version(&module, &path.version).await?;
    Ok(download.into_module_response())
}
