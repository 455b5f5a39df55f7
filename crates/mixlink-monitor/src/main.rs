//! Mixlink Monitor - connects to the mixer daemon, mirrors its state, and
//! logs patch traffic.
//!
//! A minimal consumer of the synchronization client: it keeps a
//! [`StateTree`] mirror up to date from the patch stream, logs the patches
//! matching the configured path template, and surfaces connection health
//! from the status channel.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use mixlink_client::{ClientConfig, MixerClient, Severity};
use mixlink_core::{PathPattern, StateTree};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("mixlink=info".parse()?)
                .add_directive("mixlink_monitor=debug".parse()?),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting mixlink monitor");

    let config = config::load_config()?;
    info!(endpoint = %config.daemon.endpoint, "Configuration loaded");

    let client = Arc::new(MixerClient::new(ClientConfig {
        endpoint: config.daemon.endpoint.clone(),
        retry_interval: Duration::from_secs(config.daemon.retry_interval_secs),
    }));

    // Mirror every patch; log the ones matching the configured template.
    let mirror = Arc::new(Mutex::new(StateTree::new()));
    let pattern = config.monitor.watch.as_deref().map(PathPattern::new);
    let tree = Arc::clone(&mirror);
    client.subscribe(move |patch| {
        if let Err(e) = tree.lock().apply(patch) {
            debug!(path = %patch.path, error = %e, "Patch did not apply to mirror");
        }
        if pattern.as_ref().is_none_or(|p| p.matches(&patch.path)) {
            info!(op = ?patch.op, path = %patch.path, value = ?patch.value, "Patch");
        }
    });

    // Surface connection health.
    let mut status_rx = client.status_events();
    tokio::spawn(async move {
        loop {
            match status_rx.recv().await {
                Ok(event) => match event.severity {
                    Severity::Normal => info!(message = %event.message, "Daemon status"),
                    Severity::Warning => warn!(message = %event.message, "Daemon status"),
                    Severity::Error => error!(message = %event.message, "Daemon status"),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Status events lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    client.start();

    shutdown_signal().await?;

    info!("Shutting down");
    client.stop().await;

    let devices = client.devices();
    info!(?devices, "Final device registry");

    Ok(())
}

/// Wait for SIGINT or SIGTERM. The client's own shutdown runs after this
/// resolves, so no separate channel is needed.
async fn shutdown_signal() -> Result<()> {
    let mut sigterm =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
        _ = sigterm.recv() => info!("Received SIGTERM"),
    }
    Ok(())
}
