//! Snapshot data types.
//!
//! A [`Snapshot`] is an immutable, versioned view of every source document at
//! one instant. Cloning a snapshot is cheap; the document map is shared.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Monotonic snapshot version handed out by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotVersion(u64);

impl SnapshotVersion {
    /// The version of the first snapshot a provider publishes.
    pub const INITIAL: Self = Self(1);

    /// Wraps a raw version number.
    #[must_use]
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// Returns the raw version number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the version that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Registry key of a published snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(Uuid);

impl SnapshotId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One source unit inside a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    path: Arc<str>,
    project: Arc<str>,
    checksum: Arc<str>,
    content: Arc<str>,
    generated: bool,
}

impl SourceDocument {
    /// Creates a document and computes its content checksum.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        project: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let content: String = content.into();
        Self {
            path: Arc::from(normalize_path(&path.into())),
            project: Arc::from(project.into()),
            checksum: content_checksum(&content),
            content: Arc::from(content),
            generated: false,
        }
    }

    /// Marks the document as produced by a source generator.
    #[must_use]
    pub fn with_generated(mut self, generated: bool) -> Self {
        self.generated = generated;
        self
    }

    /// Forward-slash path relative to the source root.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Name of the project that owns this document.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Hex SHA-256 of the content.
    #[must_use]
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Full document text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the document is source-generated.
    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    /// True when both documents describe identical source.
    #[must_use]
    pub fn same_source(&self, other: &Self) -> bool {
        self.checksum == other.checksum
            && self.project == other.project
            && self.generated == other.generated
    }
}

#[derive(Debug)]
struct SnapshotInner {
    id: SnapshotId,
    version: SnapshotVersion,
    captured_at: DateTime<Utc>,
    documents: BTreeMap<Arc<str>, SourceDocument>,
}

/// Immutable, versioned view of the source state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    inner: Arc<SnapshotInner>,
}

impl Snapshot {
    /// Builds a snapshot from a set of documents.
    ///
    /// Later documents with the same path replace earlier ones.
    #[must_use]
    pub fn new(
        version: SnapshotVersion,
        documents: impl IntoIterator<Item = SourceDocument>,
    ) -> Self {
        let documents = documents
            .into_iter()
            .map(|doc| (Arc::clone(&doc.path), doc))
            .collect();
        Self::from_map(version, documents)
    }

    pub(crate) fn from_map(
        version: SnapshotVersion,
        documents: BTreeMap<Arc<str>, SourceDocument>,
    ) -> Self {
        Self {
            inner: Arc::new(SnapshotInner {
                id: SnapshotId::new(),
                version,
                captured_at: Utc::now(),
                documents,
            }),
        }
    }

    /// Registry identifier.
    #[must_use]
    pub fn id(&self) -> SnapshotId {
        self.inner.id
    }

    /// Monotonic version.
    #[must_use]
    pub fn version(&self) -> SnapshotVersion {
        self.inner.version
    }

    /// When the snapshot was published.
    #[must_use]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.inner.captured_at
    }

    /// Looks up a document by path.
    #[must_use]
    pub fn document(&self, path: &str) -> Option<&SourceDocument> {
        self.inner.documents.get(normalize_path(path).as_str())
    }

    /// Documents ordered by path.
    pub fn documents(&self) -> impl Iterator<Item = &SourceDocument> {
        self.inner.documents.values()
    }

    /// Project that owns `path`, if the document exists.
    #[must_use]
    pub fn project_of(&self, path: &str) -> Option<&str> {
        self.document(path).map(SourceDocument::project)
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.documents.len()
    }

    /// True when the snapshot holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.documents.is_empty()
    }

    /// True when both handles refer to the same published snapshot.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.id == other.inner.id
    }

    pub(crate) fn document_map(&self) -> &BTreeMap<Arc<str>, SourceDocument> {
        &self.inner.documents
    }
}

/// Computes the hex SHA-256 checksum of document content.
#[must_use]
pub fn content_checksum(content: &str) -> Arc<str> {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Arc::from(hex::encode(hasher.finalize()))
}

/// Normalizes separators so lookups are stable across platforms.
pub(crate) fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.trim_start_matches("./").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_tracks_content() {
        let a = SourceDocument::new("src/lib.rs", "core", "fn a() {}");
        let b = SourceDocument::new("src/lib.rs", "core", "fn a() {}");
        let c = SourceDocument::new("src/lib.rs", "core", "fn b() {}");

        assert_eq!(a.checksum(), b.checksum());
        assert_ne!(a.checksum(), c.checksum());
        assert_eq!(a.checksum().len(), 64);
        assert!(a.same_source(&b));
        assert!(!a.same_source(&c));
    }

    #[test]
    fn test_paths_are_normalized() {
        let doc = SourceDocument::new(".\\src\\main.rs", "app", "");
        assert_eq!(doc.path(), "src/main.rs");

        let snapshot = Snapshot::new(SnapshotVersion::INITIAL, [doc]);
        assert!(snapshot.document("src\\main.rs").is_some());
        assert_eq!(snapshot.project_of("./src/main.rs"), Some("app"));
    }

    #[test]
    fn test_duplicate_paths_keep_last() {
        let snapshot = Snapshot::new(
            SnapshotVersion::INITIAL,
            [
                SourceDocument::new("a.rs", "p", "old"),
                SourceDocument::new("a.rs", "p", "new"),
            ],
        );

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.document("a.rs").map(SourceDocument::content), Some("new"));
    }

    #[test]
    fn test_clones_share_identity() {
        let snapshot = Snapshot::new(SnapshotVersion::new(3), []);
        let clone = snapshot.clone();
        let other = Snapshot::new(SnapshotVersion::new(3), []);

        assert!(snapshot.same_as(&clone));
        assert!(!snapshot.same_as(&other));
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.version().to_string(), "v3");
        assert_eq!(snapshot.version().next(), SnapshotVersion::new(4));
    }
}
