//! Shared test utilities for integration tests.
//!
//! Provides a temporary source tree wired to a snapshot store, the checksum
//! engine, a session coordinator and a polling watcher.

#![allow(dead_code)]

use anyhow::Result;
use hotreload_kernel::engine::ChecksumDiffEngine;
use hotreload_kernel::infrastructure::config::WatchSettings;
use hotreload_kernel::session::SessionCoordinator;
use hotreload_kernel::snapshot::{SnapshotStore, scan_directory};
use hotreload_kernel::watch::PollingWatcher;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Integration test context providing shared resources.
pub struct IntegrationTestContext {
    /// Temporary source tree
    pub temp_dir: TempDir,
    /// Snapshot store fed by the watcher
    pub store: Arc<SnapshotStore>,
    /// Coordinator under test
    pub coordinator: Arc<SessionCoordinator>,
    /// Watcher polling `temp_dir`
    pub watcher: PollingWatcher,
    /// Token passed to every operation
    pub cancel: CancellationToken,
}

impl IntegrationTestContext {
    /// Creates a context over a tree seeded with `files`, with the session started.
    pub async fn with_files(files: &[(&str, &str)]) -> Result<Self> {
        Self::with_settings(files, WatchSettings::default()).await
    }

    /// Same as [`Self::with_files`] with custom watch settings.
    pub async fn with_settings(files: &[(&str, &str)], settings: WatchSettings) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        for (path, content) in files {
            write_file(temp_dir.path(), path, content)?;
        }

        let store = Arc::new(SnapshotStore::new());
        store.replace_all(scan_directory(temp_dir.path(), &settings)?);

        let engine = Arc::new(ChecksumDiffEngine::new().with_syntax_error_marker("#error"));
        let coordinator = Arc::new(SessionCoordinator::new(store.clone(), engine));
        let cancel = CancellationToken::new();
        coordinator.start_session(&cancel).await?;

        let watcher = PollingWatcher::new(
            temp_dir.path(),
            settings,
            store.clone(),
            coordinator.clone(),
        );

        Ok(Self {
            temp_dir,
            store,
            coordinator,
            watcher,
            cancel,
        })
    }

    /// Gets the path to the temporary directory.
    pub fn temp_path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Writes a file relative to the tree root.
    pub fn write(&self, path: &str, content: &str) -> Result<()> {
        write_file(self.temp_dir.path(), path, content)
    }

    /// Removes a file relative to the tree root.
    pub fn remove(&self, path: &str) -> Result<()> {
        std::fs::remove_file(self.temp_dir.path().join(path))?;
        Ok(())
    }
}

fn write_file(root: &Path, path: &str, content: &str) -> Result<()> {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(full, content)?;
    Ok(())
}
