//! Failure containment at the coordinator's collaborator boundary.
//!
//! Every collaborator call runs through [`guarded`], which races it against
//! the caller's cancellation token, or [`settled`], which only checks the token
//! before the call starts. Both turn errors and panics into a [`Fault`]. Faults are handed to an [`ErrorReporter`] exactly once.

use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio_util::sync::CancellationToken;
use tracing::error;

use super::state::Operation;
use super::types::{Cancelled, ProtocolViolation};
use crate::engine::EngineError;
use crate::snapshot::ProviderError;

/// An unexpected failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// The snapshot provider failed.
    #[error("Snapshot provider failed: {0}")]
    Provider(#[from] ProviderError),
    /// The diff engine failed.
    #[error("Diff engine failed: {0}")]
    Engine(#[from] EngineError),
    /// A collaborator panicked.
    #[error("Collaborator panicked: {0}")]
    Panic(String),
    /// The caller broke the update protocol.
    #[error("Protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),
}

/// A fault attributed to the operation it interrupted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    /// Operation that failed.
    pub operation: Operation,
    /// What went wrong.
    pub fault: Fault,
}

/// Sink for unexpected failures.
pub trait ErrorReporter: Send + Sync {
    /// Records one failure.
    fn report(&self, report: &FailureReport);
}

/// Reports failures as `tracing` error events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, report: &FailureReport) {
        error!(
            operation = %report.operation,
            error = %report.fault,
            "Hot reload operation failed"
        );
    }
}

/// Outcome of a guarded call that did not succeed.
#[derive(Debug)]
pub(crate) enum Failure {
    Cancelled,
    Fault(Fault),
}

impl From<Cancelled> for Failure {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

/// Runs `fut` unless `cancel` fires first, containing errors and panics.
pub(crate) async fn guarded<F, T, E>(cancel: &CancellationToken, fut: F) -> Result<T, Failure>
where
    F: Future<Output = Result<T, E>>,
    E: Into<Fault>,
{
    if cancel.is_cancelled() {
        return Err(Failure::Cancelled);
    }

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Failure::Cancelled),
        outcome = contained(fut) => outcome,
    }
}

/// Like [`guarded`], but `cancel` is only honored before the call starts.
///
/// Used for calls that make engine-side state permanent, so the coordinator
/// never records a cancellation the engine did not observe.
pub(crate) async fn settled<F, T, E>(cancel: &CancellationToken, fut: F) -> Result<T, Failure>
where
    F: Future<Output = Result<T, E>>,
    E: Into<Fault>,
{
    if cancel.is_cancelled() {
        return Err(Failure::Cancelled);
    }
    contained(fut).await
}

async fn contained<F, T, E>(fut: F) -> Result<T, Failure>
where
    F: Future<Output = Result<T, E>>,
    E: Into<Fault>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(Failure::Fault(err.into())),
        Err(payload) => Err(Failure::Fault(Fault::Panic(panic_message(payload.as_ref())))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn explode() -> Result<(), EngineError> {
        panic!("engine exploded")
    }

    #[tokio::test]
    async fn test_guarded_passes_values_through() {
        let cancel = CancellationToken::new();
        let value = guarded(&cancel, async { Ok::<_, EngineError>(7) }).await;
        assert!(matches!(value, Ok(7)));
    }

    #[tokio::test]
    async fn test_guarded_converts_errors_and_panics() {
        let cancel = CancellationToken::new();

        let failed = guarded(&cancel, async {
            Err::<(), _>(EngineError::Internal("boom".into()))
        })
        .await;
        assert!(matches!(
            failed,
            Err(Failure::Fault(Fault::Engine(EngineError::Internal(_))))
        ));

        let panicked = guarded(&cancel, explode()).await;
        match panicked {
            Err(Failure::Fault(Fault::Panic(message))) => assert_eq!(message, "engine exploded"),
            other => panic!("expected panic fault, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_guarded_does_not_start_after_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let started = std::sync::atomic::AtomicBool::new(false);
        let outcome = guarded(&cancel, async {
            started.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok::<_, EngineError>(())
        })
        .await;
        assert!(matches!(outcome, Err(Failure::Cancelled)));
        assert!(!started.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_settled_runs_to_completion_once_started() {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let outcome = settled(&cancel, async move {
            token.cancel();
            tokio::task::yield_now().await;
            Ok::<_, EngineError>(3)
        })
        .await;
        assert!(matches!(outcome, Ok(3)));

        let outcome = settled(&cancel, async { Ok::<_, EngineError>(4) }).await;
        assert!(matches!(outcome, Err(Failure::Cancelled)));
    }

    #[tokio::test]
    async fn test_guarded_cancels_pending_call() {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let outcome = guarded(&cancel, async move {
            token.cancel();
            std::future::pending::<Result<(), EngineError>>().await
        })
        .await;
        assert!(matches!(outcome, Err(Failure::Cancelled)));
    }
}
