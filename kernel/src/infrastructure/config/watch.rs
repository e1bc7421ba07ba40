//! Source tree polling configuration.

use serde::Deserialize;

/// Settings for scanning and polling a source tree.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WatchSettings {
    /// Interval between scans in milliseconds (default: 500)
    pub poll_interval_ms: u64,
    /// File extensions treated as source; empty accepts every file (default: ["rs"])
    pub extensions: Vec<String>,
    /// Directory names never descended into (default: ["target", "node_modules"])
    pub ignored_dirs: Vec<String>,
    /// Published snapshots kept resolvable by id (default: 16)
    pub snapshot_history: usize,
    /// Commit ready updates automatically; otherwise they are discarded (default: true)
    pub auto_commit: bool,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            extensions: vec!["rs".to_string()],
            ignored_dirs: vec!["target".to_string(), "node_modules".to_string()],
            snapshot_history: default_snapshot_history(),
            auto_commit: true,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_snapshot_history() -> usize {
    16
}
