//! Hotreload Kernel - session coordination for applying source edits to a
//! running process without restarting it.
//!
//! The [`session::SessionCoordinator`] sits between a [`snapshot::SnapshotProvider`]
//! that hands out immutable, versioned source snapshots and a
//! [`engine::DiffEngine`] that turns two snapshots into deltas. It owns the
//! session lifecycle, the `get_updates -> commit | discard` protocol and the
//! fail-closed handling of unexpected collaborator failures.

#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Inbound break and capability notifications from the debugger side.
pub mod bridge;
/// Diagnostic model, descriptors and aggregation.
pub mod diagnostics;
/// Diff engine contract and the checksum reference engine.
pub mod engine;
/// Session lifecycle events.
pub mod events;
/// Infrastructure components (config, server, telemetry, audit).
pub mod infrastructure;
/// The session coordinator.
pub mod session;
/// Source snapshots and snapshot providers.
pub mod snapshot;
/// Source tree polling driver.
pub mod watch;
