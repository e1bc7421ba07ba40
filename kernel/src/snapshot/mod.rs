//! Source snapshots, the provider contract, and reference providers.

pub mod changes;
pub mod directory;
pub mod provider;
pub mod store;
pub mod types;

pub use changes::has_changes;
pub use directory::{ScanError, scan_directory};
pub use provider::{ProviderError, SnapshotProvider};
pub use store::SnapshotStore;
pub use types::{Snapshot, SnapshotId, SnapshotVersion, SourceDocument, content_checksum};
