use anyhow::{Context, Result};
use control::admin::{AdminServer, AdminState};
use control::{ControllerConfig, KubeResourceClient, Manager};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Gatewarden - GatewayClass manager
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (needed for Kubernetes TLS client)
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok(); // Ignore error if already installed

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ControllerConfig::from_env().context("invalid configuration")?;
    info!("Gatewarden starting for controller {}", config.controller_name);

    let client = kube::Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;
    let client = Arc::new(KubeResourceClient::new(client, config.request_timeout()));

    let manager = Manager::new(config.clone(), client);
    let shutdown = CancellationToken::new();

    let admin = AdminServer::bind(
        &config.admin_bind_addr,
        AdminState {
            readiness: manager.readiness(),
            store: manager.store(),
        },
    )
    .await
    .with_context(|| format!("failed to bind admin endpoint {}", config.admin_bind_addr))?;

    let mut handles = manager.spawn(shutdown.clone());
    handles.push(tokio::spawn(admin.run(shutdown.clone())));

    info!("Press Ctrl-C to exit.");
    signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
    info!("Shutdown signal received");

    manager.readiness().set_ready(false);
    shutdown.cancel();

    let drain = futures::future::join_all(handles);
    if tokio::time::timeout(config.shutdown_grace(), drain)
        .await
        .is_err()
    {
        warn!(
            "Tasks still running after {:?}, exiting anyway",
            config.shutdown_grace()
        );
    }

    info!("Gatewarden stopped");
    Ok(())
}
