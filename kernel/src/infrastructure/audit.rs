use serde::Serialize;
use tracing::{info, info_span};

/// Lifecycle event for audit logging.
/// Structured for JSON serialization to enable machine-readable audit trails.
#[derive(Debug, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// The kernel process started.
    SystemStartup {
        /// Component that started.
        component: String,
    },
    /// The kernel process is shutting down.
    SystemShutdown {
        /// Why it is shutting down.
        reason: String,
    },
    /// A hot-reload session started.
    SessionStarted {
        /// Baseline snapshot version.
        version: u64,
    },
    /// A pending update became the committed baseline.
    UpdatesCommitted {
        /// New committed version.
        version: u64,
    },
    /// Hot reload was disabled after an unexpected failure.
    SessionDisabled {
        /// Operation that failed.
        operation: String,
        /// Failure text.
        reason: String,
    },
    /// A hot-reload session ended.
    SessionEnded,
}

/// Logs an audit event to the dedicated audit channel as structured JSON.
/// This uses a specific `target` which can be filtered by the subscriber to redirect to a separate file.
pub fn log_audit(event: &AuditEvent) {
    let span = info_span!(target: "audit", "audit_event");
    let _enter = span.enter();

    let json = serde_json::to_string(event).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"));
    info!(target: "audit", audit_json = %json, "Audit Event");
}
