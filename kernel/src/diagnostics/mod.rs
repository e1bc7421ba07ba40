//! Diagnostics reported alongside hot-reload updates.

pub mod aggregator;
pub mod descriptors;

pub use aggregator::DiagnosticsAggregator;
pub use descriptors::DiagnosticDescriptor;

use serde::Serialize;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational.
    Info,
    /// Warning that does not block the update.
    Warning,
    /// Error that blocks the update.
    Error,
    /// The update cannot be applied without restarting the process.
    RestartRequired,
}

/// 1-based line/column span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct SourceSpan {
    /// First line.
    pub start_line: u32,
    /// First column.
    pub start_column: u32,
    /// Last line.
    pub end_line: u32,
    /// Column after the last character.
    pub end_column: u32,
}

impl SourceSpan {
    /// Zero-width span at `line`:`column`.
    #[must_use]
    pub const fn point(line: u32, column: u32) -> Self {
        Self {
            start_line: line,
            start_column: column,
            end_line: line,
            end_column: column,
        }
    }
}

/// Document path plus span.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Location {
    /// Document path relative to the source root.
    pub path: String,
    /// Span inside the document.
    pub span: SourceSpan,
}

impl Location {
    /// Creates a location.
    #[must_use]
    pub fn new(path: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            path: path.into(),
            span,
        }
    }
}

/// A reportable diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Stable diagnostic code.
    pub id: String,
    /// Severity.
    pub severity: Severity,
    /// Human readable message.
    pub message: String,
    /// Where the diagnostic applies, if anywhere.
    pub location: Option<Location>,
    /// Owning project, filled in from the snapshot by the aggregator.
    pub project: Option<String>,
}

impl Diagnostic {
    /// Creates a diagnostic without location or project.
    #[must_use]
    pub fn new(id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            location: None,
            project: None,
        }
    }

    /// Attaches a location.
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attaches project context.
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }
}
