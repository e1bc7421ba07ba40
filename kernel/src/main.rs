//! Hotreload Kernel server binary.

use anyhow::Context;
use hotreload_kernel::engine::ChecksumDiffEngine;
use hotreload_kernel::infrastructure::{audit, config::Settings, server, telemetry::TelemetryBuilder};
use hotreload_kernel::session::SessionCoordinator;
use hotreload_kernel::snapshot::{SnapshotStore, scan_directory};
use hotreload_kernel::watch::PollingWatcher;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Settings::new().context("Failed to load configuration")?;

    let root = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from("."), PathBuf::from);

    TelemetryBuilder::from_settings(&config.telemetry, env!("CARGO_PKG_VERSION"))
        .init()
        .context("Failed to initialize telemetry")?;
    let metrics = server::install_metrics_recorder()?;

    info!(root = %root.display(), "Hotreload Kernel Starting...");
    audit::log_audit(&audit::AuditEvent::SystemStartup {
        component: "Kernel".into(),
    });

    let store = Arc::new(SnapshotStore::with_history_limit(config.watch.snapshot_history));
    let documents = scan_directory(&root, &config.watch)
        .with_context(|| format!("Failed to scan {}", root.display()))?;
    info!(documents = documents.len(), "Initial snapshot captured");
    store.replace_all(documents);

    let engine = Arc::new(
        ChecksumDiffEngine::new().with_syntax_error_marker(config.engine.syntax_error_marker.clone()),
    );
    let coordinator = Arc::new(
        SessionCoordinator::new(store.clone(), engine).with_settings(config.session.clone()),
    );

    let shutdown = CancellationToken::new();
    coordinator.start_session(&shutdown).await?;

    let server_task = if config.server.enabled {
        let server_config = config.server.clone();
        let coordinator = coordinator.clone();
        let token = shutdown.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = server::run_server(&server_config, coordinator, metrics, token).await {
                error!("Control Plane failed: {:?}", e);
            }
        }))
    } else {
        None
    };

    let watcher = PollingWatcher::new(root, config.watch.clone(), store, coordinator.clone());
    let watch_token = shutdown.clone();
    let watch_task = tokio::spawn(async move { watcher.run(watch_token).await });

    info!("Hotreload Kernel Initialized. Waiting for shutdown signal...");

    shutdown_signal().await;

    info!("Shutdown signal received, cleaning up...");
    shutdown.cancel();
    if let Err(e) = watch_task.await {
        error!("Watcher task failed: {:?}", e);
    }
    if let Some(task) = server_task
        && let Err(e) = task.await
    {
        error!("Control Plane task failed: {:?}", e);
    }

    coordinator.end_session(&CancellationToken::new()).await?;
    audit::log_audit(&audit::AuditEvent::SystemShutdown {
        reason: "Signal received".into(),
    });

    info!("Hotreload Kernel Shutdown Complete.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
