use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod api;
mod cluster;
mod config;
mod engine;
mod events;
mod node;
mod reconciler;
mod scaling;
mod state;

#[cfg(test)]
mod tests;

use cluster::KubeCluster;
use config::AppConfig;
use events::EventHub;
use node::StatvfsSampler;
use reconciler::Reconciler;
pub use state::{AppState, DaemonState, DaemonStatus};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "volumescaler=info,tower_http=info".into()),
        )
        .init();

    info!("VolumeScaler v{} starting up", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    info!(
        "Configuration loaded: port={}, pods_path={}, interval={}s, node={}",
        config.port,
        config.kubelet_pods_path,
        config.poll_interval_secs,
        config.node_name.as_deref().unwrap_or("-")
    );

    let cluster = KubeCluster::connect(&config.event_component, config.node_name.clone()).await?;

    let state = Arc::new(AppState::new(config.clone(), EventHub::new(256)));
    let shutdown = CancellationToken::new();

    let app = api::router(Arc::clone(&state));
    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Status API listening on {}", bind_addr);

    let server_shutdown = shutdown.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).with_graceful_shutdown(server_shutdown.cancelled_owned()).await
    });

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_shutdown.cancel();
    });

    let reconciler = Reconciler::new(cluster, StatvfsSampler, Arc::clone(&state));
    reconciler.run(shutdown.clone()).await;

    shutdown.cancel();
    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Status API failed: {}", e),
        Err(e) => error!("Status API task failed: {}", e),
    }

    info!("VolumeScaler shut down cleanly");
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { warn!("Received Ctrl+C, shutting down..."); },
        () = terminate => { warn!("Received SIGTERM, shutting down..."); },
    }
}
