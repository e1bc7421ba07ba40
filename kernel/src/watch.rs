//! Polls a source tree and drives the hot-reload cycle.
//!
//! Each tick rescans the tree into the [`SnapshotStore`], asks the coordinator
//! whether anything changed, and if so computes the update and commits it (or
//! discards it when auto-commit is off). Blocked and restart-required results
//! are logged with their diagnostics and left for the next edit.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::UpdateStatus;
use crate::infrastructure::config::WatchSettings;
use crate::session::{Cancelled, CoordinatorError, HotReloadUpdates, SessionCoordinator};
use crate::snapshot::{SnapshotStore, scan_directory};

/// What one polling tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing changed since the committed snapshot.
    Unchanged,
    /// A ready update was committed.
    Committed {
        /// Number of deltas applied.
        deltas: usize,
    },
    /// A ready update was discarded because auto-commit is off.
    Discarded {
        /// Number of deltas dropped.
        deltas: usize,
    },
    /// Errors in the source block the update.
    Blocked {
        /// Number of diagnostics reported.
        diagnostics: usize,
    },
    /// The edit needs a restart.
    RestartRequired {
        /// Number of diagnostics reported.
        diagnostics: usize,
    },
    /// The tree could not be scanned; the store was left unchanged.
    ScanFailed,
    /// Hot reload is not running.
    Inactive,
}

/// Polling driver for one source root.
pub struct PollingWatcher {
    root: PathBuf,
    settings: WatchSettings,
    store: Arc<SnapshotStore>,
    coordinator: Arc<SessionCoordinator>,
}

impl PollingWatcher {
    /// Creates a watcher for `root` feeding `store`.
    #[must_use]
    pub fn new(
        root: impl Into<PathBuf>,
        settings: WatchSettings,
        store: Arc<SnapshotStore>,
        coordinator: Arc<SessionCoordinator>,
    ) -> Self {
        Self {
            root: root.into(),
            settings,
            store,
            coordinator,
        }
    }

    /// Rescans the tree into the store. Returns false if the scan failed.
    pub async fn rescan(&self) -> bool {
        let root = self.root.clone();
        let settings = self.settings.clone();
        match tokio::task::spawn_blocking(move || scan_directory(&root, &settings)).await {
            Ok(Ok(documents)) => {
                let version = self.store.replace_all(documents);
                debug!(%version, "Source tree scanned");
                true
            }
            Ok(Err(e)) => {
                warn!(root = %self.root.display(), error = %e, "Failed to scan source tree");
                false
            }
            Err(e) => {
                error!(error = %e, "Scan task failed");
                false
            }
        }
    }

    /// Runs one scan and update cycle.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `cancel` fires during a coordinator call.
    pub async fn tick(&self, cancel: &CancellationToken) -> Result<TickOutcome, Cancelled> {
        if !self.rescan().await {
            return Ok(TickOutcome::ScanFailed);
        }
        if self.coordinator.status().committed_version.is_none() {
            return Ok(TickOutcome::Inactive);
        }
        if !self.coordinator.has_changes(None, cancel).await? {
            return Ok(TickOutcome::Unchanged);
        }

        let updates = self.coordinator.get_updates(cancel).await?;
        if self.coordinator.is_disabled() {
            log_diagnostics(&updates);
            return Ok(TickOutcome::Inactive);
        }

        match updates.status {
            UpdateStatus::Ready => self.settle(updates.deltas.len(), cancel).await,
            UpdateStatus::Blocked => {
                log_diagnostics(&updates);
                Ok(TickOutcome::Blocked {
                    diagnostics: updates.diagnostics.len(),
                })
            }
            UpdateStatus::RestartRequired => {
                log_diagnostics(&updates);
                Ok(TickOutcome::RestartRequired {
                    diagnostics: updates.diagnostics.len(),
                })
            }
        }
    }

    async fn settle(&self, deltas: usize, cancel: &CancellationToken) -> Result<TickOutcome, Cancelled> {
        let settled = if self.settings.auto_commit {
            self.coordinator.commit_updates(cancel).await
        } else {
            self.coordinator.discard_updates(cancel).await
        };

        match settled {
            Ok(()) if self.coordinator.is_disabled() => Ok(TickOutcome::Inactive),
            Ok(()) if self.settings.auto_commit => {
                info!(deltas, "Applied hot reload update");
                Ok(TickOutcome::Committed { deltas })
            }
            Ok(()) => Ok(TickOutcome::Discarded { deltas }),
            Err(CoordinatorError::Cancelled(cancelled)) => Err(cancelled),
            Err(CoordinatorError::ProtocolViolation(violation)) => {
                error!(error = %violation, "Update protocol violated");
                Ok(TickOutcome::Inactive)
            }
        }
    }

    /// Polls until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = interval(Duration::from_millis(self.settings.poll_interval_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            root = %self.root.display(),
            interval_ms = self.settings.poll_interval_ms,
            "Watching source tree"
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.tick(&cancel).await {
                Ok(TickOutcome::Unchanged) => {}
                Ok(outcome) => debug!(?outcome, "Poll tick finished"),
                Err(Cancelled) => break,
            }
        }

        debug!("Watcher stopped");
    }
}

fn log_diagnostics(updates: &HotReloadUpdates) {
    for diagnostic in &updates.diagnostics {
        warn!(
            id = %diagnostic.id,
            severity = ?diagnostic.severity,
            path = diagnostic.location.as_ref().map(|l| l.path.as_str()),
            message = %diagnostic.message,
            "Hot reload diagnostic"
        );
    }
}
