//! Diagnostic descriptors for session-level and rude-edit diagnostics.

use crate::engine::RudeEditKind;

/// Stable id plus message template. Placeholders are `{0}`, `{1}`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticDescriptor {
    /// Diagnostic code.
    pub id: &'static str,
    /// Message template.
    pub message_format: &'static str,
}

impl DiagnosticDescriptor {
    /// Substitutes positional arguments into the template.
    #[must_use]
    pub fn format(&self, args: &[&str]) -> String {
        args.iter()
            .enumerate()
            .fold(self.message_format.to_string(), |message, (index, arg)| {
                message.replace(&format!("{{{index}}}"), arg)
            })
    }
}

/// Synthesized when the diff engine fails unexpectedly.
pub const INTERNAL_ERROR: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "HR0001",
    message_format: "Hot reload can't continue due to an internal error: {0}",
};

/// Reported by engines for the first syntax error in a candidate snapshot.
pub const SYNTAX_ERROR: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "HR0002",
    message_format: "Syntax error in '{0}' blocks applying changes",
};

const DELETE_UNIT: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "HR0101",
    message_format: "Deleting source unit '{0}' requires restarting the application",
};

const SIGNATURE_CHANGE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "HR0102",
    message_format: "Changing the signature of '{0}' requires restarting the application",
};

const ACTIVE_STATEMENT_UPDATE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "HR0103",
    message_format: "Updating an active statement in '{0}' requires restarting the application",
};

const UNSUPPORTED: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "HR0104",
    message_format: "The change in '{0}' is not supported by the runtime",
};

/// Descriptor used to report a rude edit of the given kind.
#[must_use]
pub fn rude_edit(kind: RudeEditKind) -> &'static DiagnosticDescriptor {
    match kind {
        RudeEditKind::DeleteUnit => &DELETE_UNIT,
        RudeEditKind::SignatureChange => &SIGNATURE_CHANGE,
        RudeEditKind::ActiveStatementUpdate => &ACTIVE_STATEMENT_UPDATE,
        RudeEditKind::Unsupported => &UNSUPPORTED,
    }
}
