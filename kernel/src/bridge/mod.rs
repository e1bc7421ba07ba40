//! Inbound process-bridge notifications.
//!
//! The debugger side reports break transitions and capability changes as
//! [`BridgeEvent`]s on an `mpsc` channel; a [`BridgeListener`] turns each one
//! into the matching coordinator call.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::session::{Cancelled, SessionCoordinator};

/// Notification from the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeEvent {
    /// The process stopped at a break.
    BreakEntered,
    /// The process resumed.
    BreakExited,
    /// Attach, detach or runtime capability change.
    CapabilitiesChanged,
}

/// Creates a bridge channel with the given buffer size.
#[must_use]
pub fn channel(buffer: usize) -> (mpsc::Sender<BridgeEvent>, mpsc::Receiver<BridgeEvent>) {
    mpsc::channel(buffer)
}

/// Forwards bridge events to a coordinator.
pub struct BridgeListener {
    coordinator: Arc<SessionCoordinator>,
    events: mpsc::Receiver<BridgeEvent>,
}

impl BridgeListener {
    /// Creates a listener draining `events` into `coordinator`.
    #[must_use]
    pub fn new(coordinator: Arc<SessionCoordinator>, events: mpsc::Receiver<BridgeEvent>) -> Self {
        Self {
            coordinator,
            events,
        }
    }

    /// Processes events until the channel closes or `cancel` fires.
    ///
    /// Returns the number of events handled.
    pub async fn run(mut self, cancel: CancellationToken) -> usize {
        let mut handled = 0;

        loop {
            let event = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = self.events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            debug!(?event, "Bridge event received");
            if self.dispatch(event, &cancel).await.is_err() {
                break;
            }
            handled += 1;
        }

        info!(handled, "Bridge listener stopped");
        handled
    }

    /// Runs the listener on a background task.
    #[must_use]
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<usize> {
        tokio::spawn(self.run(cancel))
    }

    async fn dispatch(&self, event: BridgeEvent, cancel: &CancellationToken) -> Result<(), Cancelled> {
        match event {
            BridgeEvent::BreakEntered => self.coordinator.enter_break(cancel).await,
            BridgeEvent::BreakExited => self.coordinator.exit_break(cancel).await,
            BridgeEvent::CapabilitiesChanged => self.coordinator.on_capabilities_changed(cancel).await,
        }
    }
}
