//! In-memory snapshot registry.
//!
//! The store keeps the current document set, publishes a new [`Snapshot`] with
//! the next version whenever the content actually changes, and remembers the
//! most recent snapshots by id so they can be resolved later. Entries are
//! evicted oldest first once the history limit is reached, and all of them are
//! dropped by [`SnapshotStore::clear`].

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

use super::provider::{ProviderError, SnapshotProvider};
use super::types::{Snapshot, SnapshotId, SnapshotVersion, SourceDocument, normalize_path};

/// Default number of published snapshots kept resolvable by id.
pub const DEFAULT_HISTORY_LIMIT: usize = 16;

#[derive(Debug)]
struct StoreState {
    documents: BTreeMap<Arc<str>, SourceDocument>,
    current: Snapshot,
    registered: HashMap<SnapshotId, Snapshot>,
    order: VecDeque<SnapshotId>,
}

/// Versioned in-memory snapshot store.
#[derive(Debug)]
pub struct SnapshotStore {
    state: RwLock<StoreState>,
    history_limit: usize,
}

impl SnapshotStore {
    /// Creates an empty store whose first snapshot is [`SnapshotVersion::INITIAL`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Creates an empty store that keeps at most `limit` snapshots resolvable.
    #[must_use]
    pub fn with_history_limit(limit: usize) -> Self {
        let current = Snapshot::from_map(SnapshotVersion::INITIAL, BTreeMap::new());
        let mut state = StoreState {
            documents: BTreeMap::new(),
            current: current.clone(),
            registered: HashMap::new(),
            order: VecDeque::new(),
        };
        let limit = limit.max(1);
        register(&mut state, current, limit);
        Self {
            state: RwLock::new(state),
            history_limit: limit,
        }
    }

    /// Inserts or replaces a document. Returns the resulting version.
    pub fn upsert_document(&self, document: SourceDocument) -> SnapshotVersion {
        let mut state = self.state.write();
        if state
            .documents
            .get(document.path())
            .is_some_and(|existing| existing.same_source(&document))
        {
            return state.current.version();
        }
        state
            .documents
            .insert(Arc::from(document.path()), document);
        self.publish(&mut state)
    }

    /// Removes a document. Returns `None` when the path was not present.
    pub fn remove_document(&self, path: &str) -> Option<SnapshotVersion> {
        let mut state = self.state.write();
        state.documents.remove(normalize_path(path).as_str())?;
        Some(self.publish(&mut state))
    }

    /// Replaces the whole document set, publishing only if something changed.
    pub fn replace_all(
        &self,
        documents: impl IntoIterator<Item = SourceDocument>,
    ) -> SnapshotVersion {
        let incoming: BTreeMap<Arc<str>, SourceDocument> = documents
            .into_iter()
            .map(|doc| (Arc::from(doc.path()), doc))
            .collect();

        let mut state = self.state.write();
        let unchanged = incoming.len() == state.documents.len()
            && incoming.iter().all(|(path, doc)| {
                state
                    .documents
                    .get(path)
                    .is_some_and(|existing| existing.same_source(doc))
            });
        if unchanged {
            return state.current.version();
        }

        state.documents = incoming;
        self.publish(&mut state)
    }

    /// Returns the latest published snapshot.
    #[must_use]
    pub fn current_snapshot(&self) -> Snapshot {
        self.state.read().current.clone()
    }

    /// Resolves a registered snapshot by id.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotRegistered`] if the snapshot was evicted or
    /// the store was cleared.
    pub fn get(&self, id: SnapshotId) -> Result<Snapshot, ProviderError> {
        self.state
            .read()
            .registered
            .get(&id)
            .cloned()
            .ok_or(ProviderError::NotRegistered(id))
    }

    /// Number of snapshots currently resolvable by id.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.state.read().registered.len()
    }

    /// Drops every registered snapshot. The current snapshot stays readable
    /// through [`SnapshotStore::current_snapshot`].
    pub fn clear(&self) {
        let mut state = self.state.write();
        debug!(released = state.registered.len(), "Clearing snapshot registry");
        state.registered.clear();
        state.order.clear();
    }

    fn publish(&self, state: &mut StoreState) -> SnapshotVersion {
        let version = state.current.version().next();
        let snapshot = Snapshot::from_map(version, state.documents.clone());
        state.current = snapshot.clone();
        register(state, snapshot, self.history_limit);
        debug!(%version, documents = state.documents.len(), "Published snapshot");
        version
    }
}

fn register(state: &mut StoreState, snapshot: Snapshot, limit: usize) {
    while state.order.len() >= limit {
        if let Some(evicted) = state.order.pop_front() {
            state.registered.remove(&evicted);
        }
    }
    state.order.push_back(snapshot.id());
    state.registered.insert(snapshot.id(), snapshot);
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotProvider for SnapshotStore {
    async fn current(&self) -> Result<Snapshot, ProviderError> {
        Ok(self.current_snapshot())
    }

    async fn resolve(&self, id: SnapshotId) -> Result<Snapshot, ProviderError> {
        self.get(id)
    }

    fn release(&self) {
        self.clear();
    }
}
