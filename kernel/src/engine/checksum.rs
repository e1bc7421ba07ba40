//! Checksum-based reference diff engine.
//!
//! Compares two snapshots document by document. Added and modified units become
//! one delta each, deleted units are rude edits, and a unit containing the
//! configured syntax-error marker blocks the update. It exists to drive the
//! coordinator end to end; it does not compile anything.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, instrument};

use super::types::{Delta, EngineSessionId, RudeEdit, RudeEditKind, UpdateResult, UpdateStatus};
use super::{DiffEngine, EngineError, StartOptions};
use crate::diagnostics::descriptors::SYNTAX_ERROR;
use crate::diagnostics::{Diagnostic, Location, Severity, SourceSpan};
use crate::snapshot::{Snapshot, SnapshotVersion, SourceDocument};

/// Change to one source unit between two snapshots.
#[derive(Debug, Clone, Copy)]
pub enum UnitChange<'a> {
    /// Unit exists only in the target.
    Added(&'a SourceDocument),
    /// Unit exists in both with different content.
    Modified(&'a SourceDocument),
    /// Unit exists only in the baseline.
    Deleted(&'a SourceDocument),
}

/// Lists per-unit changes from `baseline` to `target`, ordered by path.
#[must_use]
pub fn diff_snapshots<'a>(baseline: &'a Snapshot, target: &'a Snapshot) -> Vec<UnitChange<'a>> {
    let mut changes = Vec::new();

    for doc in target.documents() {
        match baseline.document(doc.path()) {
            Some(prev) if prev.same_source(doc) => {}
            Some(_) => changes.push(UnitChange::Modified(doc)),
            None => changes.push(UnitChange::Added(doc)),
        }
    }

    for doc in baseline.documents() {
        if target.document(doc.path()).is_none() {
            changes.push(UnitChange::Deleted(doc));
        }
    }

    changes.sort_by(|a, b| a.document().path().cmp(b.document().path()));
    changes
}

impl<'a> UnitChange<'a> {
    /// The document this change refers to.
    #[must_use]
    pub fn document(&self) -> &'a SourceDocument {
        match self {
            Self::Added(doc) | Self::Modified(doc) | Self::Deleted(doc) => doc,
        }
    }
}

#[derive(Debug)]
struct EngineSession {
    baseline: SnapshotVersion,
    tentative: Option<SnapshotVersion>,
    in_break: Option<bool>,
    report_diagnostics: bool,
}

/// Reference [`DiffEngine`] driven by content checksums.
#[derive(Debug, Default)]
pub struct ChecksumDiffEngine {
    sessions: RwLock<HashMap<EngineSessionId, EngineSession>>,
    syntax_error_marker: Option<String>,
}

impl ChecksumDiffEngine {
    /// Creates an engine with no syntax-error marker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Treats any changed unit containing `marker` as having a syntax error.
    #[must_use]
    pub fn with_syntax_error_marker(mut self, marker: impl Into<String>) -> Self {
        let marker = marker.into();
        self.syntax_error_marker = (!marker.is_empty()).then_some(marker);
        self
    }

    /// Number of open debugging contexts.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Version of the permanent baseline of `session`.
    #[must_use]
    pub fn baseline_version(&self, session: EngineSessionId) -> Option<SnapshotVersion> {
        self.sessions.read().get(&session).map(|s| s.baseline)
    }

    /// Last break state reported for `session`.
    #[must_use]
    pub fn break_state(&self, session: EngineSessionId) -> Option<bool> {
        self.sessions.read().get(&session).and_then(|s| s.in_break)
    }

    fn syntax_error(&self, changes: &[UnitChange<'_>]) -> Option<Diagnostic> {
        let marker = self.syntax_error_marker.as_deref()?;
        changes.iter().find_map(|change| {
            let doc = match change {
                UnitChange::Added(doc) | UnitChange::Modified(doc) => doc,
                UnitChange::Deleted(_) => return None,
            };
            let offset = doc.content().find(marker)?;
            Some(
                Diagnostic::new(SYNTAX_ERROR.id, Severity::Error, SYNTAX_ERROR.format(&[doc.path()]))
                    .with_location(Location::new(doc.path(), position_of(doc.content(), offset))),
            )
        })
    }
}

fn position_of(content: &str, offset: usize) -> SourceSpan {
    let before = &content[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(offset, |nl| offset - nl - 1) + 1;
    SourceSpan::point(
        u32::try_from(line).unwrap_or(u32::MAX),
        u32::try_from(column).unwrap_or(u32::MAX),
    )
}

#[async_trait]
impl DiffEngine for ChecksumDiffEngine {
    #[instrument(skip(self, baseline), fields(version = %baseline.version()))]
    async fn start(
        &self,
        baseline: &Snapshot,
        options: StartOptions,
    ) -> Result<EngineSessionId, EngineError> {
        let id = EngineSessionId::new();
        self.sessions.write().insert(
            id,
            EngineSession {
                baseline: baseline.version(),
                tentative: None,
                in_break: None,
                report_diagnostics: options.report_diagnostics,
            },
        );
        debug!(session = %id, "Engine session started");
        Ok(id)
    }

    async fn break_state_changed(
        &self,
        session: EngineSessionId,
        in_break: Option<bool>,
    ) -> Result<(), EngineError> {
        let mut sessions = self.sessions.write();
        let entry = sessions
            .get_mut(&session)
            .ok_or(EngineError::UnknownSession(session))?;
        if in_break.is_some() {
            entry.in_break = in_break;
        }
        Ok(())
    }

    #[instrument(skip(self, baseline, target), fields(from = %baseline.version(), to = %target.version()))]
    async fn compute(
        &self,
        session: EngineSessionId,
        baseline: &Snapshot,
        target: &Snapshot,
    ) -> Result<UpdateResult, EngineError> {
        let report_diagnostics = self
            .sessions
            .read()
            .get(&session)
            .map(|s| s.report_diagnostics)
            .ok_or(EngineError::UnknownSession(session))?;
        let changes = diff_snapshots(baseline, target);

        let result = if let Some(syntax_error) = self.syntax_error(&changes) {
            UpdateResult {
                status: UpdateStatus::Blocked,
                syntax_error: report_diagnostics.then_some(syntax_error),
                ..UpdateResult::default()
            }
        } else {
            let rude_edits: Vec<RudeEdit> = changes
                .iter()
                .filter_map(|change| match change {
                    UnitChange::Deleted(doc) => Some(RudeEdit::new(
                        RudeEditKind::DeleteUnit,
                        Location::new(doc.path(), SourceSpan::point(1, 1)),
                    )),
                    _ => None,
                })
                .collect();

            if rude_edits.is_empty() {
                UpdateResult::ready(
                    changes
                        .iter()
                        .map(|change| {
                            let doc = change.document();
                            Delta::new(
                                doc.path(),
                                doc.project(),
                                Bytes::copy_from_slice(doc.content().as_bytes()),
                            )
                        })
                        .collect(),
                )
            } else {
                UpdateResult {
                    status: UpdateStatus::RestartRequired,
                    rude_edits,
                    ..UpdateResult::default()
                }
            }
        };

        let mut sessions = self.sessions.write();
        let entry = sessions
            .get_mut(&session)
            .ok_or(EngineError::UnknownSession(session))?;
        if result.status == UpdateStatus::Ready {
            entry.tentative = Some(target.version());
        }
        debug!(status = %result.status, deltas = result.deltas.len(), "Computed update");
        Ok(result)
    }

    async fn commit(&self, session: EngineSessionId) -> Result<(), EngineError> {
        let mut sessions = self.sessions.write();
        let entry = sessions
            .get_mut(&session)
            .ok_or(EngineError::UnknownSession(session))?;
        entry.baseline = entry
            .tentative
            .take()
            .ok_or(EngineError::NoPendingUpdate(session))?;
        Ok(())
    }

    async fn discard(&self, session: EngineSessionId) -> Result<(), EngineError> {
        let mut sessions = self.sessions.write();
        let entry = sessions
            .get_mut(&session)
            .ok_or(EngineError::UnknownSession(session))?;
        entry
            .tentative
            .take()
            .map(|_| ())
            .ok_or(EngineError::NoPendingUpdate(session))
    }

    async fn end(&self, session: EngineSessionId) -> Result<(), EngineError> {
        self.sessions
            .write()
            .remove(&session)
            .map(|_| ())
            .ok_or(EngineError::UnknownSession(session))
    }
}
