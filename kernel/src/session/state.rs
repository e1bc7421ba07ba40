//! Session state machine: `NoSession -> Active -> Disabled`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::EngineSessionId;
use crate::snapshot::Snapshot;

/// Whether the debuggee is stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakState {
    /// No break transition has been observed yet.
    #[default]
    Unknown,
    /// The debuggee is running.
    Running,
    /// The debuggee is stopped at a break.
    Broken,
}

impl BreakState {
    /// Applies a transition; `None` is a capability change and keeps the state.
    #[must_use]
    pub const fn apply(self, in_break: Option<bool>) -> Self {
        match in_break {
            Some(true) => Self::Broken,
            Some(false) => Self::Running,
            None => self,
        }
    }
}

/// Coordinator operations, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// `start_session`
    StartSession,
    /// `enter_break`
    EnterBreak,
    /// `exit_break`
    ExitBreak,
    /// `on_capabilities_changed`
    CapabilitiesChanged,
    /// `has_changes`
    HasChanges,
    /// `get_updates`
    GetUpdates,
    /// `commit_updates`
    CommitUpdates,
    /// `discard_updates`
    DiscardUpdates,
    /// `end_session`
    EndSession,
}

impl Operation {
    /// Stable name used in logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StartSession => "start_session",
            Self::EnterBreak => "enter_break",
            Self::ExitBreak => "exit_break",
            Self::CapabilitiesChanged => "capabilities_changed",
            Self::HasChanges => "has_changes",
            Self::GetUpdates => "get_updates",
            Self::CommitUpdates => "commit_updates",
            Self::DiscardUpdates => "discard_updates",
            Self::EndSession => "end_session",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The failure that turned hot reload off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisableReason {
    /// Operation during which the failure happened.
    pub operation: Operation,
    /// Failure text.
    pub message: String,
    /// When the session was disabled.
    pub disabled_at: DateTime<Utc>,
}

impl DisableReason {
    /// Creates a reason stamped with the current time.
    #[must_use]
    pub fn new(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
            disabled_at: Utc::now(),
        }
    }
}

/// A running hot-reload session.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    engine_session: EngineSessionId,
    committed: Snapshot,
    pending: Option<Snapshot>,
    break_state: BreakState,
}

impl ActiveSession {
    pub(crate) fn new(engine_session: EngineSessionId, committed: Snapshot) -> Self {
        Self {
            engine_session,
            committed,
            pending: None,
            break_state: BreakState::Unknown,
        }
    }

    /// Engine-side debugging context.
    #[must_use]
    pub fn engine_session(&self) -> EngineSessionId {
        self.engine_session
    }

    /// Snapshot the running process currently reflects.
    #[must_use]
    pub fn committed(&self) -> &Snapshot {
        &self.committed
    }

    /// Candidate from the last ready update, awaiting commit or discard.
    #[must_use]
    pub fn pending(&self) -> Option<&Snapshot> {
        self.pending.as_ref()
    }

    /// Last observed break state.
    #[must_use]
    pub fn break_state(&self) -> BreakState {
        self.break_state
    }

    pub(crate) fn set_pending(&mut self, snapshot: Snapshot) {
        self.pending = Some(snapshot);
    }

    pub(crate) fn set_break_state(&mut self, in_break: Option<bool>) -> BreakState {
        self.break_state = self.break_state.apply(in_break);
        self.break_state
    }

    /// Moves the pending snapshot into the committed slot.
    pub(crate) fn promote_pending(&mut self) -> Option<&Snapshot> {
        let pending = self.pending.take()?;
        self.committed = pending;
        Some(&self.committed)
    }

    pub(crate) fn take_pending(&mut self) -> Option<Snapshot> {
        self.pending.take()
    }
}

/// Coordinator state. `Disabled` is terminal for the coordinator's lifetime.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// Nothing started.
    #[default]
    NoSession,
    /// A session is running.
    Active(ActiveSession),
    /// Hot reload was turned off.
    Disabled(DisableReason),
}

impl SessionState {
    /// The active session, if any.
    #[must_use]
    pub fn active(&self) -> Option<&ActiveSession> {
        match self {
            Self::Active(session) => Some(session),
            _ => None,
        }
    }

    pub(crate) fn active_mut(&mut self) -> Option<&mut ActiveSession> {
        match self {
            Self::Active(session) => Some(session),
            _ => None,
        }
    }

    /// Whether hot reload has been disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled(_))
    }
}
