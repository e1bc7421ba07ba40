//! Snapshot provider contract.

use async_trait::async_trait;

use super::types::{Snapshot, SnapshotId};

/// Errors raised by snapshot providers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The editing surface could not produce a snapshot.
    #[error("Snapshot source unavailable: {0}")]
    Unavailable(String),
    /// A snapshot id was resolved after it had been released.
    #[error("Snapshot not registered: {0}")]
    NotRegistered(SnapshotId),
}

/// Supplies the current source snapshot on demand.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Returns the most recent snapshot.
    async fn current(&self) -> Result<Snapshot, ProviderError>;

    /// Resolves a previously published snapshot by id.
    ///
    /// Providers that keep no history answer [`ProviderError::NotRegistered`].
    async fn resolve(&self, id: SnapshotId) -> Result<Snapshot, ProviderError> {
        Err(ProviderError::NotRegistered(id))
    }

    /// Drops snapshots retained on behalf of a session that has been disabled.
    fn release(&self) {}
}
