//! Diff engine contract and the checksum reference engine.
//!
//! A [`DiffEngine`] owns the compilation side of a hot-reload session: it
//! analyzes a baseline and a candidate snapshot and produces deltas,
//! diagnostics and rude-edit classifications. The coordinator never looks
//! inside the results beyond their status.

pub mod checksum;
pub mod types;

pub use checksum::ChecksumDiffEngine;
pub use types::{Delta, EngineSessionId, RudeEdit, RudeEditKind, UpdateResult, UpdateStatus};

use async_trait::async_trait;

use crate::snapshot::Snapshot;

/// Options passed when a debugging context is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartOptions {
    /// Whether the engine attaches diagnostics to its results. Statuses and
    /// rude edits are reported either way.
    pub report_diagnostics: bool,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            report_diagnostics: true,
        }
    }
}

/// Errors raised by a diff engine. Any of these is unexpected from the
/// coordinator's point of view.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The session id is not known to the engine.
    #[error("Unknown engine session: {0}")]
    UnknownSession(EngineSessionId),
    /// Commit or discard was requested with no tentative update.
    #[error("No tentative update in engine session {0}")]
    NoPendingUpdate(EngineSessionId),
    /// Any other engine failure.
    #[error("Internal engine error: {0}")]
    Internal(String),
}

/// Computes updates between snapshots and tracks the engine-side baseline.
#[async_trait]
pub trait DiffEngine: Send + Sync {
    /// Opens a debugging context whose baseline is `baseline`.
    async fn start(
        &self,
        baseline: &Snapshot,
        options: StartOptions,
    ) -> Result<EngineSessionId, EngineError>;

    /// Reports a break-state transition (`Some`) or a capability change (`None`).
    async fn break_state_changed(
        &self,
        session: EngineSessionId,
        in_break: Option<bool>,
    ) -> Result<(), EngineError>;

    /// Computes the update that turns `baseline` into `target`.
    ///
    /// Compile errors and rude edits are reported inside the result; an `Err`
    /// means the engine itself failed.
    async fn compute(
        &self,
        session: EngineSessionId,
        baseline: &Snapshot,
        target: &Snapshot,
    ) -> Result<UpdateResult, EngineError>;

    /// Makes the last tentative update part of the permanent baseline.
    async fn commit(&self, session: EngineSessionId) -> Result<(), EngineError>;

    /// Drops the last tentative update.
    async fn discard(&self, session: EngineSessionId) -> Result<(), EngineError>;

    /// Tears down the debugging context.
    async fn end(&self, session: EngineSessionId) -> Result<(), EngineError>;
}
