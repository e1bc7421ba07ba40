//! Merges engine output into one ordered diagnostic list.

use super::descriptors::{self, INTERNAL_ERROR};
use super::{Diagnostic, Severity};
use crate::engine::{RudeEdit, UpdateResult, UpdateStatus};
use crate::snapshot::Snapshot;

/// Combines engine diagnostics, the syntax error and rude edits, attaching
/// project context from the snapshot they were computed against.
///
/// Output order: engine diagnostics as given, then the syntax error, then rude
/// edits sorted by location.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticsAggregator<'a> {
    snapshot: &'a Snapshot,
}

impl<'a> DiagnosticsAggregator<'a> {
    /// Creates an aggregator for diagnostics computed against `snapshot`.
    #[must_use]
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self { snapshot }
    }

    /// Merges every diagnostic carried by `result`.
    #[must_use]
    pub fn merge(&self, result: &UpdateResult) -> Vec<Diagnostic> {
        self.collect(
            result.status,
            &result.diagnostics,
            &result.rude_edits,
            result.syntax_error.as_ref(),
        )
    }

    /// Merges the individual parts of an update result.
    #[must_use]
    pub fn collect(
        &self,
        status: UpdateStatus,
        diagnostics: &[Diagnostic],
        rude_edits: &[RudeEdit],
        syntax_error: Option<&Diagnostic>,
    ) -> Vec<Diagnostic> {
        let mut merged = Vec::with_capacity(
            diagnostics.len() + rude_edits.len() + usize::from(syntax_error.is_some()),
        );

        merged.extend(diagnostics.iter().cloned().map(|d| self.with_context(d)));
        merged.extend(syntax_error.cloned().map(|d| self.with_context(d)));

        let severity = if status == UpdateStatus::RestartRequired {
            Severity::RestartRequired
        } else {
            Severity::Error
        };

        let mut sorted: Vec<&RudeEdit> = rude_edits.iter().collect();
        sorted.sort_by(|a, b| a.location.cmp(&b.location).then(a.kind.cmp(&b.kind)));

        for edit in sorted {
            let descriptor = descriptors::rude_edit(edit.kind);
            let argument = edit.argument.as_deref().unwrap_or(edit.location.path.as_str());
            let diagnostic = Diagnostic::new(descriptor.id, severity, descriptor.format(&[argument]))
                .with_location(edit.location.clone());
            merged.push(self.with_context(diagnostic));
        }

        merged
    }

    /// The synthetic diagnostic reported when the engine fails unexpectedly.
    #[must_use]
    pub fn internal_error(message: &str) -> Diagnostic {
        Diagnostic::new(
            INTERNAL_ERROR.id,
            Severity::RestartRequired,
            INTERNAL_ERROR.format(&[message]),
        )
    }

    fn with_context(&self, mut diagnostic: Diagnostic) -> Diagnostic {
        if diagnostic.project.is_none() {
            diagnostic.project = diagnostic
                .location
                .as_ref()
                .and_then(|location| self.snapshot.project_of(&location.path))
                .map(str::to_string);
        }
        diagnostic
    }
}
