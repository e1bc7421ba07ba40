use crate::infrastructure::config::{BindAddress, ServerSettings};
use crate::session::{SessionCoordinator, SessionPhase, SessionStatus};
use crate::snapshot::{Snapshot, SnapshotId};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Serialize)]
struct SnapshotSummary {
    id: SnapshotId,
    version: u64,
    captured_at: DateTime<Utc>,
    documents: Vec<String>,
}

impl From<&Snapshot> for SnapshotSummary {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            id: snapshot.id(),
            version: snapshot.version().get(),
            captured_at: snapshot.captured_at(),
            documents: snapshot.documents().map(|d| d.path().to_string()).collect(),
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}

async fn readiness(State(coordinator): State<Arc<SessionCoordinator>>) -> (StatusCode, &'static str) {
    match coordinator.status().phase {
        SessionPhase::Active => (StatusCode::OK, "OK"),
        SessionPhase::NoSession => (StatusCode::SERVICE_UNAVAILABLE, "No session"),
        SessionPhase::Disabled => (StatusCode::SERVICE_UNAVAILABLE, "Hot reload disabled"),
    }
}

async fn session_status(State(coordinator): State<Arc<SessionCoordinator>>) -> Json<SessionStatus> {
    Json(coordinator.status())
}

async fn snapshot_summary(
    State(coordinator): State<Arc<SessionCoordinator>>,
    Path(id): Path<SnapshotId>,
) -> Result<Json<SnapshotSummary>, StatusCode> {
    match coordinator.resolve_snapshot(id).await {
        Ok(snapshot) => Ok(Json(SnapshotSummary::from(&snapshot))),
        Err(e) => {
            tracing::debug!(%id, error = %e, "Snapshot lookup failed");
            Err(StatusCode::NOT_FOUND)
        }
    }
}

/// Installs the global Prometheus recorder backing the `/metrics` route.
///
/// # Errors
///
/// Returns an error if a recorder is already installed.
pub fn install_metrics_recorder() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {e}"))
}

/// Builds the control plane router.
#[must_use]
pub fn router(coordinator: Arc<SessionCoordinator>, metrics: PrometheusHandle) -> Router {
    Router::new()
        .route("/health/live", get(health_check))
        .route("/health/ready", get(readiness))
        .route("/session", get(session_status))
        .route("/snapshots/{id}", get(snapshot_summary))
        .route("/metrics", get(move || std::future::ready(metrics.render())))
        .with_state(coordinator)
}

/// Runs the control plane HTTP server until `shutdown` fires.
///
/// # Errors
///
/// Returns an error if the server fails to start or encounters an error while running.
pub async fn run_server(
    config: &ServerSettings,
    coordinator: Arc<SessionCoordinator>,
    metrics: PrometheusHandle,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let app = router(coordinator, metrics);
    let addr = BindAddress::from(config).to_socket_addr()?;

    tracing::info!("Control Plane listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}
