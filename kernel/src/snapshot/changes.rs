//! Change detection between two snapshots.
//!
//! This is a heuristic. A false positive costs one wasted diff computation that
//! yields no deltas; a false negative only skips an automatic apply opportunity.
//! Which checks are skipped is controlled by [`ChangeDetectionSettings`].

use super::types::{Snapshot, SourceDocument, normalize_path};
use crate::infrastructure::config::ChangeDetectionSettings;

/// Returns true if `latest` differs from `committed`, optionally restricted to
/// the document at `scope`.
#[must_use]
pub fn has_changes(
    committed: &Snapshot,
    latest: &Snapshot,
    scope: Option<&str>,
    settings: &ChangeDetectionSettings,
) -> bool {
    if committed.same_as(latest) {
        return false;
    }
    if settings.trust_versions && committed.version() == latest.version() {
        return false;
    }

    match scope {
        Some(path) => document_changed(committed, latest, &normalize_path(path)),
        None => any_document_changed(committed, latest, settings.include_generated),
    }
}

fn document_changed(committed: &Snapshot, latest: &Snapshot, path: &str) -> bool {
    let old = committed.document(path);
    let new = latest.document(path);

    // Scoped checks are not supported for generated documents.
    if old.is_some_and(SourceDocument::is_generated) || new.is_some_and(SourceDocument::is_generated)
    {
        return false;
    }

    match (old, new) {
        (Some(old), Some(new)) => !old.same_source(new),
        (None, None) => false,
        _ => true,
    }
}

fn any_document_changed(committed: &Snapshot, latest: &Snapshot, include_generated: bool) -> bool {
    let relevant = |doc: &&SourceDocument| include_generated || !doc.is_generated();

    let old = committed.document_map();
    let new = latest.document_map();

    let modified_or_added = new
        .values()
        .filter(relevant)
        .any(|doc| old.get(doc.path()).is_none_or(|prev| !prev.same_source(doc)));
    if modified_or_added {
        return true;
    }

    old.values()
        .filter(relevant)
        .any(|doc| !new.contains_key(doc.path()))
}
