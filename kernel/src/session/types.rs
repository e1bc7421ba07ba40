//! Public value types of the session coordinator.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::state::{BreakState, DisableReason, SessionState};
use crate::diagnostics::Diagnostic;
use crate::engine::{Delta, UpdateStatus};
use crate::snapshot::SnapshotId;

/// The operation was cancelled before it completed. No session state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Operation cancelled")]
pub struct Cancelled;

/// The caller broke the `get_updates -> commit | discard` protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolViolation {
    /// `commit_updates` without a preceding ready update.
    #[error("Commit requested without a pending update")]
    CommitWithoutPending,
    /// `discard_updates` without a preceding ready update.
    #[error("Discard requested without a pending update")]
    DiscardWithoutPending,
}

/// Errors surfaced by [`commit_updates`] and [`discard_updates`].
///
/// [`commit_updates`]: super::SessionCoordinator::commit_updates
/// [`discard_updates`]: super::SessionCoordinator::discard_updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CoordinatorError {
    /// See [`Cancelled`].
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    /// See [`ProtocolViolation`].
    #[error(transparent)]
    ProtocolViolation(#[from] ProtocolViolation),
}

/// Result of [`get_updates`](super::SessionCoordinator::get_updates).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HotReloadUpdates {
    /// Overall status.
    pub status: UpdateStatus,
    /// Deltas to apply when `status` is ready.
    pub deltas: Vec<Delta>,
    /// Merged diagnostics, see [`DiagnosticsAggregator`](crate::diagnostics::DiagnosticsAggregator).
    pub diagnostics: Vec<Diagnostic>,
}

impl HotReloadUpdates {
    /// The neutral result: ready, nothing to apply, nothing to report.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether there is nothing to apply and nothing to report.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status == UpdateStatus::Ready && self.deltas.is_empty() && self.diagnostics.is_empty()
    }
}

/// Coarse lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No session has been started, or the last one ended.
    NoSession,
    /// A session is running.
    Active,
    /// Hot reload was turned off after an unexpected failure.
    Disabled,
}

/// Point-in-time view of the coordinator, served on the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// Break state of the debuggee, when a session is active.
    pub break_state: Option<BreakState>,
    /// Whether a ready update awaits commit or discard.
    pub has_pending: bool,
    /// Version of the committed snapshot.
    pub committed_version: Option<u64>,
    /// Registry id of the committed snapshot.
    pub committed_id: Option<SnapshotId>,
    /// When the committed snapshot was published.
    pub committed_at: Option<DateTime<Utc>>,
    /// Version of the pending snapshot.
    pub pending_version: Option<u64>,
    /// Why hot reload was disabled.
    pub disable_reason: Option<DisableReason>,
}

impl From<&SessionState> for SessionStatus {
    fn from(state: &SessionState) -> Self {
        match state {
            SessionState::NoSession => Self {
                phase: SessionPhase::NoSession,
                break_state: None,
                has_pending: false,
                committed_version: None,
                committed_id: None,
                committed_at: None,
                pending_version: None,
                disable_reason: None,
            },
            SessionState::Active(session) => Self {
                phase: SessionPhase::Active,
                break_state: Some(session.break_state()),
                has_pending: session.pending().is_some(),
                committed_version: Some(session.committed().version().get()),
                committed_id: Some(session.committed().id()),
                committed_at: Some(session.committed().captured_at()),
                pending_version: session.pending().map(|s| s.version().get()),
                disable_reason: None,
            },
            SessionState::Disabled(reason) => Self {
                phase: SessionPhase::Disabled,
                break_state: None,
                has_pending: false,
                committed_version: None,
                committed_id: None,
                committed_at: None,
                pending_version: None,
                disable_reason: Some(reason.clone()),
            },
        }
    }
}
