//! Types produced by a diff engine.

use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::diagnostics::{Diagnostic, Location};

/// Identifies a debugging context opened in the diff engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineSessionId(Uuid);

impl EngineSessionId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EngineSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EngineSessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a computed update can be applied to the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    /// Deltas (possibly none) are ready to apply.
    #[default]
    Ready,
    /// Errors in the candidate source block the update.
    Blocked,
    /// The edit cannot be applied live; the process must restart.
    RestartRequired,
}

impl UpdateStatus {
    /// Stable lowercase name, used for metrics labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Blocked => "blocked",
            Self::RestartRequired => "restart_required",
        }
    }
}

impl std::fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque unit of change the running process knows how to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    path: Arc<str>,
    project: Arc<str>,
    payload: Bytes,
}

impl Delta {
    /// Creates a delta for the source unit at `path`.
    #[must_use]
    pub fn new(path: impl Into<Arc<str>>, project: impl Into<Arc<str>>, payload: Bytes) -> Self {
        Self {
            path: path.into(),
            project: project.into(),
            payload,
        }
    }

    /// Source unit the delta was produced from.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Project that owns the source unit.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Opaque payload.
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
}

/// Classification of an edit that cannot be applied live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RudeEditKind {
    /// A source unit was deleted.
    DeleteUnit,
    /// A declaration signature changed.
    SignatureChange,
    /// A statement that is currently executing was modified.
    ActiveStatementUpdate,
    /// The runtime does not support this kind of change.
    Unsupported,
}

/// A rude edit located in a source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RudeEdit {
    /// What kind of unsupported edit it is.
    pub kind: RudeEditKind,
    /// Where the edit happened.
    pub location: Location,
    /// Optional argument substituted into the diagnostic message.
    pub argument: Option<String>,
}

impl RudeEdit {
    /// Creates a rude edit without a message argument.
    #[must_use]
    pub fn new(kind: RudeEditKind, location: Location) -> Self {
        Self {
            kind,
            location,
            argument: None,
        }
    }

    /// Sets the message argument.
    #[must_use]
    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = Some(argument.into());
        self
    }
}

/// Outcome of one diff computation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateResult {
    /// Overall status.
    pub status: UpdateStatus,
    /// Deltas to apply; empty unless `status` is `Ready`.
    pub deltas: Vec<Delta>,
    /// Compilation diagnostics.
    pub diagnostics: Vec<Diagnostic>,
    /// Edits that cannot be applied live.
    pub rude_edits: Vec<RudeEdit>,
    /// First syntax error in the candidate source, if any.
    pub syntax_error: Option<Diagnostic>,
}

impl UpdateResult {
    /// A `Ready` result carrying `deltas`.
    #[must_use]
    pub fn ready(deltas: Vec<Delta>) -> Self {
        Self {
            deltas,
            ..Self::default()
        }
    }
}
