//! `miso serve`: run the registry and health servers until a shutdown signal
//!
//! Both servers stop accepting connections on the same signal and then get a
//! bounded grace period to drain in-flight requests.

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use miso_registry::{app, health_router, Metrics, RegistryHandler};
use miso_storage::S3Storage;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use super::CommandContext;
use crate::setup_logging;

/// Time allowed for in-flight requests once shutdown starts
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub async fn execute(ctx: &CommandContext) -> anyhow::Result<()> {
    let (config, source) = ctx.load_config().await?;
    setup_logging(ctx.log_level(&config), config.app.log_format);
    info!(version = env!("CARGO_PKG_VERSION"), ?source, "starting miso");

    let storage = S3Storage::from_config(&config.s3).await;
    info!(
        bucket = storage.bucket(),
        endpoint = config.s3.endpoint.as_deref().unwrap_or("default"),
        download_mode = %config.s3.download_mode,
        "object storage configured"
    );
    let handler = RegistryHandler::new(Arc::new(storage), config.s3.download_mode);

    let registry_addr = config.app.listen_addr();
    let registry = TcpListener::bind(&registry_addr)
        .await
        .with_context(|| format!("failed to bind registry listener on {}", registry_addr))?;
    let health_addr = config.health_addr();
    let health = TcpListener::bind(&health_addr)
        .await
        .with_context(|| format!("failed to bind health listener on {}", health_addr))?;

    serve(registry, health, handler, shutdown_signal()).await
}

/// Serve on already-bound listeners until `shutdown` resolves
pub async fn serve<F>(
    registry: TcpListener,
    health: TcpListener,
    handler: RegistryHandler,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let registry_addr = registry.local_addr().context("registry listener has no address")?;
    let health_addr = health.local_addr().context("health listener has no address")?;

    let metrics = Metrics::new().context("failed to register metrics")?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let registry_server = axum::serve(registry, app(handler, metrics.clone()))
        .with_graceful_shutdown(stopped(stop_rx.clone()))
        .into_future();
    let health_server = axum::serve(health, health_router(metrics))
        .with_graceful_shutdown(stopped(stop_rx.clone()))
        .into_future();

    let mut servers = tokio::spawn(async move { tokio::try_join!(registry_server, health_server) });
    info!(%registry_addr, %health_addr, "miso listening");

    tokio::spawn(async move {
        shutdown.await;
        let _ = stop_tx.send(true);
    });

    tokio::select! {
        joined = &mut servers => return finish(joined),
        _ = stopped(stop_rx) => info!("shutting down"),
    }

    match tokio::time::timeout(SHUTDOWN_GRACE, &mut servers).await {
        Ok(joined) => finish(joined),
        Err(_) => {
            warn!(grace_secs = SHUTDOWN_GRACE.as_secs(), "connections still open, forcing shutdown");
            servers.abort();
            Ok(())
        }
    }
}

fn finish(
    joined: Result<std::io::Result<((), ())>, tokio::task::JoinError>,
) -> anyhow::Result<()> {
    match joined {
        Ok(Ok(_)) => {
            info!("miso stopped");
            Ok(())
        }
        Ok(Err(e)) => {
            error!(error = %e, "server failed");
            Err(e).context("server failed")
        }
        Err(e) => Err(e).context("server task aborted"),
    }
}

async fn stopped(mut stop: watch::Receiver<bool>) {
    // A dropped sender means nobody can ask us to stop any more
    if stop.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
