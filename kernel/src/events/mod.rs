//! Session lifecycle events.
//!
//! The coordinator publishes a [`SessionEvent`] after every state change;
//! subscribers get them through an [`EventReceiver`].

pub mod broadcaster;

pub use broadcaster::{EventBroadcaster, EventError, EventReceiver};

use serde::Serialize;

use crate::engine::UpdateStatus;
use crate::session::{BreakState, Operation};

/// A state change of the hot-reload session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A session started at the given snapshot version.
    Started {
        /// Baseline version.
        version: u64,
    },
    /// The debuggee stopped or resumed.
    BreakStateChanged {
        /// New break state.
        break_state: BreakState,
    },
    /// `get_updates` produced a result.
    UpdatesComputed {
        /// Result status.
        status: UpdateStatus,
        /// Candidate snapshot version.
        version: u64,
        /// Number of deltas.
        deltas: usize,
        /// Number of merged diagnostics.
        diagnostics: usize,
    },
    /// The pending update became the committed baseline.
    Committed {
        /// New committed version.
        version: u64,
    },
    /// The pending update was dropped.
    Discarded {
        /// Version of the dropped candidate.
        version: u64,
    },
    /// The session ended normally.
    Ended,
    /// Hot reload was turned off.
    Disabled {
        /// Operation that failed.
        operation: Operation,
        /// Failure text.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_with_tag() {
        let json = serde_json::to_value(SessionEvent::UpdatesComputed {
            status: UpdateStatus::RestartRequired,
            version: 3,
            deltas: 0,
            diagnostics: 1,
        })
        .unwrap();

        assert_eq!(json["event"], "updates_computed");
        assert_eq!(json["status"], "restart_required");
        assert_eq!(json["version"], 3);

        let json = serde_json::to_value(SessionEvent::Ended).unwrap();
        assert_eq!(json, serde_json::json!({ "event": "ended" }));
    }
}
