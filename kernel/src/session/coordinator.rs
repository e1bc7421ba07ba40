//! The session coordinator.
//!
//! Every mutating operation has the same shape: take the operation gate,
//! validate preconditions against the current state, call collaborators
//! through [`guarded`] (or [`settled`] for commit, discard and end), and only
//! then write the new state. An unexpected failure is reported once and turns
//! hot reload off for the lifetime of the coordinator. Cancellation leaves the
//! state exactly as it was.

use metrics::counter;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::failure::{
    ErrorReporter, Failure, FailureReport, Fault, TracingErrorReporter, guarded, settled,
};
use super::state::{ActiveSession, DisableReason, Operation, SessionState};
use super::types::{
    Cancelled, CoordinatorError, HotReloadUpdates, ProtocolViolation, SessionPhase, SessionStatus,
};
use crate::diagnostics::DiagnosticsAggregator;
use crate::engine::{DiffEngine, EngineSessionId, StartOptions, UpdateStatus};
use crate::events::{EventBroadcaster, EventReceiver, SessionEvent};
use crate::infrastructure::audit::{AuditEvent, log_audit};
use crate::infrastructure::config::SessionSettings;
use crate::snapshot::{self, ProviderError, Snapshot, SnapshotId, SnapshotProvider};

enum PendingCheck {
    Disabled,
    Missing,
    Present(EngineSessionId, Snapshot),
}

/// Owns the hot-reload session and drives the update protocol.
pub struct SessionCoordinator {
    provider: Arc<dyn SnapshotProvider>,
    engine: Arc<dyn DiffEngine>,
    reporter: Arc<dyn ErrorReporter>,
    settings: SessionSettings,
    state: RwLock<SessionState>,
    gate: Mutex<()>,
    events: EventBroadcaster,
}

impl SessionCoordinator {
    /// Creates a coordinator with no session, reporting failures via `tracing`.
    #[must_use]
    pub fn new(provider: Arc<dyn SnapshotProvider>, engine: Arc<dyn DiffEngine>) -> Self {
        Self {
            provider,
            engine,
            reporter: Arc::new(TracingErrorReporter),
            settings: SessionSettings::default(),
            state: RwLock::new(SessionState::NoSession),
            gate: Mutex::new(()),
            events: EventBroadcaster::new(),
        }
    }

    /// Replaces the error reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replaces the session settings.
    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        SessionStatus::from(&*self.state.read())
    }

    /// Copy of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Whether hot reload has been disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.state.read().is_disabled()
    }

    /// Subscribes to session events.
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Resolves a published snapshot through the provider. Read-only; does not
    /// take the operation gate and never disables the session.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, typically [`ProviderError::NotRegistered`]
    /// once the snapshot was evicted or released.
    pub async fn resolve_snapshot(&self, id: SnapshotId) -> Result<Snapshot, ProviderError> {
        self.provider.resolve(id).await
    }

    /// Starts a session at the provider's current snapshot.
    ///
    /// No-op when a session is already running or hot reload is disabled.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `cancel` fires first.
    #[instrument(skip_all)]
    pub async fn start_session(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        let _gate = self.acquire(cancel).await?;

        match self.phase() {
            SessionPhase::Disabled => {
                debug!("Hot reload is disabled, ignoring start");
                return Ok(());
            }
            SessionPhase::Active => {
                debug!("Session already active, ignoring start");
                return Ok(());
            }
            SessionPhase::NoSession => {}
        }

        let started = async {
            let baseline = guarded(cancel, self.provider.current()).await?;
            let options = StartOptions {
                report_diagnostics: self.settings.report_diagnostics,
            };
            let engine_session = guarded(cancel, self.engine.start(&baseline, options)).await?;
            Ok::<_, Failure>((engine_session, baseline))
        }
        .await;

        match started {
            Ok((engine_session, baseline)) => {
                let version = baseline.version();
                *self.state.write() =
                    SessionState::Active(ActiveSession::new(engine_session, baseline));

                info!(%version, session_id = %engine_session, "Hot reload session started");
                counter!("hotreload_sessions_started_total").increment(1);
                log_audit(&AuditEvent::SessionStarted {
                    version: version.get(),
                });
                self.events.publish(SessionEvent::Started {
                    version: version.get(),
                });
                Ok(())
            }
            Err(failure) => self.contain(Operation::StartSession, failure),
        }
    }

    /// The debuggee stopped.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `cancel` fires first.
    pub async fn enter_break(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        self.break_state_changed(Operation::EnterBreak, Some(true), cancel)
            .await
    }

    /// The debuggee resumed.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `cancel` fires first.
    pub async fn exit_break(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        self.break_state_changed(Operation::ExitBreak, Some(false), cancel)
            .await
    }

    /// The debuggee's capabilities changed.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `cancel` fires first.
    pub async fn on_capabilities_changed(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(), Cancelled> {
        self.break_state_changed(Operation::CapabilitiesChanged, None, cancel)
            .await
    }

    #[instrument(skip(self, cancel))]
    async fn break_state_changed(
        &self,
        operation: Operation,
        in_break: Option<bool>,
        cancel: &CancellationToken,
    ) -> Result<(), Cancelled> {
        let _gate = self.acquire(cancel).await?;

        let Some((engine_session, _)) = self.active_context() else {
            debug!("No active session, ignoring break state change");
            return Ok(());
        };

        match guarded(cancel, self.engine.break_state_changed(engine_session, in_break)).await {
            Ok(()) => {
                let break_state = self
                    .state
                    .write()
                    .active_mut()
                    .map(|session| session.set_break_state(in_break));
                if let Some(break_state) = break_state {
                    debug!(?break_state, "Break state updated");
                    self.events
                        .publish(SessionEvent::BreakStateChanged { break_state });
                }
                Ok(())
            }
            Err(failure) => self.contain(operation, failure),
        }
    }

    /// Whether the latest snapshot differs from the committed one, either as a
    /// whole or for the single document at `scope`.
    ///
    /// This is a heuristic tuned by the change detection settings. It does not
    /// wait for in-flight operations and never disables the session: a failing
    /// provider is reported and answered with `true`.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `cancel` fires first.
    #[instrument(skip(self, cancel))]
    pub async fn has_changes(
        &self,
        scope: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<bool, Cancelled> {
        if self.active_context().is_none() {
            return Ok(false);
        }

        let latest = match guarded(cancel, self.provider.current()).await {
            Ok(latest) => latest,
            Err(Failure::Cancelled) => return Err(Cancelled),
            Err(Failure::Fault(fault)) => {
                self.reporter.report(&FailureReport {
                    operation: Operation::HasChanges,
                    fault,
                });
                return Ok(true);
            }
        };

        // The session may have moved on while the snapshot was fetched.
        let Some((_, committed)) = self.active_context() else {
            return Ok(false);
        };

        Ok(snapshot::has_changes(
            &committed,
            &latest,
            scope,
            &self.settings.change_detection,
        ))
    }

    /// Computes the update from the committed snapshot to the latest one.
    ///
    /// A ready result becomes the pending update. Engine failures never
    /// surface as errors: they produce a restart-required result carrying one
    /// internal-error diagnostic, and hot reload is disabled. Without an
    /// active session the result is [`HotReloadUpdates::empty`].
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `cancel` fires first.
    #[instrument(skip_all)]
    pub async fn get_updates(
        &self,
        cancel: &CancellationToken,
    ) -> Result<HotReloadUpdates, Cancelled> {
        let _gate = self.acquire(cancel).await?;

        let Some((engine_session, committed)) = self.active_context() else {
            return Ok(HotReloadUpdates::empty());
        };

        let latest = match guarded(cancel, self.provider.current()).await {
            Ok(latest) => latest,
            Err(failure) => {
                self.contain(Operation::GetUpdates, failure)?;
                return Ok(HotReloadUpdates::empty());
            }
        };

        let result =
            match guarded(cancel, self.engine.compute(engine_session, &committed, &latest)).await
            {
                Ok(result) => result,
                Err(Failure::Cancelled) => return Err(Cancelled),
                Err(Failure::Fault(fault)) => {
                    let diagnostic = DiagnosticsAggregator::internal_error(&fault.to_string());
                    self.disable(Operation::GetUpdates, fault);
                    counter!("hotreload_updates_total", "status" => UpdateStatus::RestartRequired.as_str())
                        .increment(1);
                    return Ok(HotReloadUpdates {
                        status: UpdateStatus::RestartRequired,
                        deltas: Vec::new(),
                        diagnostics: vec![diagnostic],
                    });
                }
            };

        let diagnostics = DiagnosticsAggregator::new(&latest).merge(&result);
        let status = result.status;
        let deltas = result.deltas;

        if status == UpdateStatus::Ready
            && let Some(session) = self.state.write().active_mut()
        {
            session.set_pending(latest.clone());
        }

        info!(
            %status,
            from = %committed.version(),
            to = %latest.version(),
            deltas = deltas.len(),
            diagnostics = diagnostics.len(),
            "Updates computed"
        );
        counter!("hotreload_updates_total", "status" => status.as_str()).increment(1);
        self.events.publish(SessionEvent::UpdatesComputed {
            status,
            version: latest.version().get(),
            deltas: deltas.len(),
            diagnostics: diagnostics.len(),
        });

        Ok(HotReloadUpdates {
            status,
            deltas,
            diagnostics,
        })
    }

    /// Makes the pending update the committed baseline.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::ProtocolViolation`] if there is no pending
    /// update; hot reload is disabled in that case. Returns
    /// [`CoordinatorError::Cancelled`] if `cancel` fires first.
    #[instrument(skip_all)]
    pub async fn commit_updates(&self, cancel: &CancellationToken) -> Result<(), CoordinatorError> {
        let _gate = self.acquire(cancel).await?;

        let (engine_session, pending) = match self.check_pending() {
            PendingCheck::Disabled => return Ok(()),
            PendingCheck::Missing => {
                return Err(self.violation(
                    Operation::CommitUpdates,
                    ProtocolViolation::CommitWithoutPending,
                ));
            }
            PendingCheck::Present(engine_session, pending) => (engine_session, pending),
        };

        match settled(cancel, self.engine.commit(engine_session)).await {
            Ok(()) => {
                if let Some(session) = self.state.write().active_mut() {
                    session.promote_pending();
                }
                let version = pending.version();
                info!(%version, "Updates committed");
                counter!("hotreload_commits_total").increment(1);
                log_audit(&AuditEvent::UpdatesCommitted {
                    version: version.get(),
                });
                self.events.publish(SessionEvent::Committed {
                    version: version.get(),
                });
                Ok(())
            }
            Err(failure) => Ok(self.contain(Operation::CommitUpdates, failure)?),
        }
    }

    /// Drops the pending update, keeping the committed baseline.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::ProtocolViolation`] if there is no pending
    /// update; hot reload is disabled in that case. Returns
    /// [`CoordinatorError::Cancelled`] if `cancel` fires first.
    #[instrument(skip_all)]
    pub async fn discard_updates(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(), CoordinatorError> {
        let _gate = self.acquire(cancel).await?;

        let (engine_session, pending) = match self.check_pending() {
            PendingCheck::Disabled => return Ok(()),
            PendingCheck::Missing => {
                return Err(self.violation(
                    Operation::DiscardUpdates,
                    ProtocolViolation::DiscardWithoutPending,
                ));
            }
            PendingCheck::Present(engine_session, pending) => (engine_session, pending),
        };

        match settled(cancel, self.engine.discard(engine_session)).await {
            Ok(()) => {
                if let Some(session) = self.state.write().active_mut() {
                    session.take_pending();
                }
                let version = pending.version();
                debug!(%version, "Updates discarded");
                counter!("hotreload_discards_total").increment(1);
                self.events.publish(SessionEvent::Discarded {
                    version: version.get(),
                });
                Ok(())
            }
            Err(failure) => Ok(self.contain(Operation::DiscardUpdates, failure)?),
        }
    }

    /// Tears the session down and returns to the no-session state.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `cancel` fires first.
    #[instrument(skip_all)]
    pub async fn end_session(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        let _gate = self.acquire(cancel).await?;

        let Some((engine_session, _)) = self.active_context() else {
            debug!("No active session to end");
            return Ok(());
        };

        match settled(cancel, self.engine.end(engine_session)).await {
            Ok(()) => {
                *self.state.write() = SessionState::NoSession;
                info!(session_id = %engine_session, "Hot reload session ended");
                log_audit(&AuditEvent::SessionEnded);
                self.events.publish(SessionEvent::Ended);
                Ok(())
            }
            Err(failure) => self.contain(Operation::EndSession, failure),
        }
    }

    async fn acquire(&self, cancel: &CancellationToken) -> Result<MutexGuard<'_, ()>, Cancelled> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Cancelled),
            guard = self.gate.lock() => Ok(guard),
        }
    }

    fn phase(&self) -> SessionPhase {
        match &*self.state.read() {
            SessionState::NoSession => SessionPhase::NoSession,
            SessionState::Active(_) => SessionPhase::Active,
            SessionState::Disabled(_) => SessionPhase::Disabled,
        }
    }

    fn active_context(&self) -> Option<(EngineSessionId, Snapshot)> {
        self.state
            .read()
            .active()
            .map(|session| (session.engine_session(), session.committed().clone()))
    }

    fn check_pending(&self) -> PendingCheck {
        match &*self.state.read() {
            SessionState::Disabled(_) => PendingCheck::Disabled,
            SessionState::NoSession => PendingCheck::Missing,
            SessionState::Active(session) => match session.pending() {
                Some(pending) => PendingCheck::Present(session.engine_session(), pending.clone()),
                None => PendingCheck::Missing,
            },
        }
    }

    fn contain(&self, operation: Operation, failure: Failure) -> Result<(), Cancelled> {
        match failure {
            Failure::Cancelled => {
                debug!(%operation, "Operation cancelled");
                Err(Cancelled)
            }
            Failure::Fault(fault) => {
                self.disable(operation, fault);
                Ok(())
            }
        }
    }

    fn violation(&self, operation: Operation, violation: ProtocolViolation) -> CoordinatorError {
        self.disable(operation, Fault::Protocol(violation));
        CoordinatorError::ProtocolViolation(violation)
    }

    fn disable(&self, operation: Operation, fault: Fault) {
        let report = FailureReport { operation, fault };
        self.reporter.report(&report);

        let message = report.fault.to_string();
        *self.state.write() = SessionState::Disabled(DisableReason::new(operation, message.clone()));
        self.provider.release();

        warn!(%operation, reason = %message, "Hot reload disabled");
        counter!("hotreload_disables_total", "operation" => operation.as_str()).increment(1);
        log_audit(&AuditEvent::SessionDisabled {
            operation: operation.to_string(),
            reason: message.clone(),
        });
        self.events
            .publish(SessionEvent::Disabled { operation, message });
    }
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("state", &*self.state.read())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
