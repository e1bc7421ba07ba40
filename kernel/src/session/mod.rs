//! Hot-reload session coordination.
//!
//! [`SessionCoordinator`] owns the session lifecycle and the
//! `get_updates -> commit | discard` protocol. It is the only component with
//! mutable cross-call state:
//!
//! ```text
//! NoSession --start--> Active --end--> NoSession
//!                        |
//!                  unexpected failure
//!                        v
//!                    Disabled (terminal)
//! ```

pub mod coordinator;
pub mod failure;
pub mod state;
pub mod types;


pub use coordinator::SessionCoordinator;
pub use failure::{ErrorReporter, FailureReport, Fault, TracingErrorReporter};
pub use state::{ActiveSession, BreakState, DisableReason, Operation, SessionState};
pub use types::{
    Cancelled, CoordinatorError, HotReloadUpdates, ProtocolViolation, SessionPhase, SessionStatus,
};
