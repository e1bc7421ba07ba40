//! End-to-end tests for the session coordinator against the reference
//! snapshot store and checksum engine.

use async_trait::async_trait;
use hotreload_kernel::diagnostics::Severity;
use hotreload_kernel::engine::{
    ChecksumDiffEngine, DiffEngine, EngineError, EngineSessionId, StartOptions, UpdateResult,
    UpdateStatus,
};
use hotreload_kernel::infrastructure::config::{ChangeDetectionSettings, SessionSettings};
use hotreload_kernel::session::{
    CoordinatorError, ProtocolViolation, SessionCoordinator, SessionPhase,
};
use hotreload_kernel::snapshot::{Snapshot, SnapshotStore, SnapshotVersion, SourceDocument};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

// =============================================================================
// Fixtures
// =============================================================================

/// Checksum engine whose `compute` can be switched to fail.
#[derive(Default)]
struct BrokenComputeEngine {
    inner: ChecksumDiffEngine,
    broken: AtomicBool,
}

#[async_trait]
impl DiffEngine for BrokenComputeEngine {
    async fn start(
        &self,
        baseline: &Snapshot,
        options: StartOptions,
    ) -> Result<EngineSessionId, EngineError> {
        self.inner.start(baseline, options).await
    }

    async fn break_state_changed(
        &self,
        session: EngineSessionId,
        in_break: Option<bool>,
    ) -> Result<(), EngineError> {
        self.inner.break_state_changed(session, in_break).await
    }

    async fn compute(
        &self,
        session: EngineSessionId,
        baseline: &Snapshot,
        target: &Snapshot,
    ) -> Result<UpdateResult, EngineError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(EngineError::Internal("analyzer crashed".into()));
        }
        self.inner.compute(session, baseline, target).await
    }

    async fn commit(&self, session: EngineSessionId) -> Result<(), EngineError> {
        self.inner.commit(session).await
    }

    async fn discard(&self, session: EngineSessionId) -> Result<(), EngineError> {
        self.inner.discard(session).await
    }

    async fn end(&self, session: EngineSessionId) -> Result<(), EngineError> {
        self.inner.end(session).await
    }
}

fn store_with(docs: &[(&str, &str)]) -> Arc<SnapshotStore> {
    let store = Arc::new(SnapshotStore::new());
    store.replace_all(
        docs.iter()
            .map(|(path, content)| SourceDocument::new(*path, "app", *content)),
    );
    store
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_single_edit_scenario() {
    let store = store_with(&[("src/lib.rs", "pub fn v1() {}"), ("src/util.rs", "")]);
    let engine = Arc::new(ChecksumDiffEngine::new());
    let coordinator = SessionCoordinator::new(store.clone(), engine.clone());
    let cancel = CancellationToken::new();

    coordinator.start_session(&cancel).await.unwrap();
    let v1 = store.current_snapshot().version();

    let updates = coordinator.get_updates(&cancel).await.unwrap();
    assert_eq!(updates.status, UpdateStatus::Ready);
    assert!(updates.deltas.is_empty());
    coordinator.discard_updates(&cancel).await.unwrap();

    let v2 = store.upsert_document(SourceDocument::new("src/lib.rs", "app", "pub fn v2() {}"));
    assert_eq!(v2, v1.next());

    let updates = coordinator.get_updates(&cancel).await.unwrap();
    assert_eq!(updates.status, UpdateStatus::Ready);
    assert_eq!(updates.deltas.len(), 1);
    assert_eq!(updates.deltas[0].path(), "src/lib.rs");
    assert_eq!(updates.deltas[0].payload().as_ref(), b"pub fn v2() {}");

    coordinator.commit_updates(&cancel).await.unwrap();
    assert_eq!(coordinator.status().committed_version, Some(v2.get()));
    assert!(!coordinator.has_changes(None, &cancel).await.unwrap());

    let session = coordinator.state().active().map(|s| s.engine_session());
    assert_eq!(
        session.and_then(|id| engine.baseline_version(id)),
        Some(v2)
    );
}

#[tokio::test]
async fn test_engine_failure_scenario() {
    let store = store_with(&[("src/lib.rs", "a")]);
    let engine = Arc::new(BrokenComputeEngine::default());
    let coordinator = SessionCoordinator::new(store.clone(), engine.clone());
    let cancel = CancellationToken::new();
    coordinator.start_session(&cancel).await.unwrap();
    let registered_before = store.registered_count();
    assert!(registered_before > 0);

    store.upsert_document(SourceDocument::new("src/lib.rs", "app", "b"));
    engine.broken.store(true, Ordering::SeqCst);

    let updates = coordinator.get_updates(&cancel).await.unwrap();
    assert_eq!(updates.status, UpdateStatus::RestartRequired);
    assert_eq!(updates.diagnostics.len(), 1);
    assert_eq!(updates.diagnostics[0].severity, Severity::RestartRequired);
    assert!(updates.diagnostics[0].message.contains("analyzer crashed"));

    assert_eq!(coordinator.status().phase, SessionPhase::Disabled);
    assert_eq!(store.registered_count(), 0);

    engine.broken.store(false, Ordering::SeqCst);
    coordinator.start_session(&cancel).await.unwrap();
    assert_eq!(coordinator.status().phase, SessionPhase::Disabled);
    assert!(coordinator.get_updates(&cancel).await.unwrap().is_empty());
    assert!(coordinator.commit_updates(&cancel).await.is_ok());
}

#[tokio::test]
async fn test_protocol_violation_without_ready_result() {
    let store = store_with(&[("a.rs", "1")]);
    let coordinator = SessionCoordinator::new(store, Arc::new(ChecksumDiffEngine::new()));
    let cancel = CancellationToken::new();
    coordinator.start_session(&cancel).await.unwrap();

    assert_eq!(
        coordinator.discard_updates(&cancel).await,
        Err(CoordinatorError::ProtocolViolation(
            ProtocolViolation::DiscardWithoutPending
        ))
    );
    assert_eq!(coordinator.status().phase, SessionPhase::Disabled);
}

#[tokio::test]
async fn test_version_heuristic_can_be_disabled() {
    let store = store_with(&[("a.rs", "1")]);
    let settings = SessionSettings {
        change_detection: ChangeDetectionSettings {
            trust_versions: false,
            include_generated: false,
        },
        ..SessionSettings::default()
    };
    let coordinator = SessionCoordinator::new(store.clone(), Arc::new(ChecksumDiffEngine::new()))
        .with_settings(settings);
    let cancel = CancellationToken::new();
    coordinator.start_session(&cancel).await.unwrap();

    // Generated documents are ignored by whole-session checks.
    store.upsert_document(SourceDocument::new("gen/out.rs", "app", "x").with_generated(true));
    assert!(!coordinator.has_changes(None, &cancel).await.unwrap());
    assert!(
        !coordinator
            .has_changes(Some("gen/out.rs"), &cancel)
            .await
            .unwrap()
    );

    store.upsert_document(SourceDocument::new("a.rs", "app", "2"));
    assert!(coordinator.has_changes(None, &cancel).await.unwrap());
    assert!(coordinator.has_changes(Some("./a.rs"), &cancel).await.unwrap());
}

#[tokio::test]
async fn test_snapshots_from_different_stores_compare_by_content() {
    let committed = Snapshot::new(
        SnapshotVersion::new(4),
        [SourceDocument::new("a.rs", "app", "same")],
    );
    let latest = Snapshot::new(
        SnapshotVersion::new(9),
        [SourceDocument::new("a.rs", "app", "same")],
    );

    let engine = ChecksumDiffEngine::new();
    let session = engine
        .start(&committed, StartOptions::default())
        .await
        .unwrap();
    let result = engine.compute(session, &committed, &latest).await.unwrap();

    assert_eq!(result.status, UpdateStatus::Ready);
    assert!(result.deltas.is_empty());
}
