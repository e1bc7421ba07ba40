//! Fan-out of session events to subscribers.

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::SessionEvent;

const EVENT_CAPACITY: usize = 256;

/// Errors raised while receiving events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    /// The coordinator was dropped.
    #[error("Event channel closed")]
    Closed,
    /// The receiver fell behind and missed events.
    #[error("Receiver lagged behind by {0} events")]
    Lagged(u64),
}

/// Broadcasts session events to every subscriber.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBroadcaster {
    /// Creates a broadcaster with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Subscribes to events published from now on.
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            inner: self.sender.subscribe(),
        }
    }

    /// Publishes an event. Having no subscribers is not an error.
    pub fn publish(&self, event: SessionEvent) {
        if let Ok(receivers) = self.sender.send(event) {
            debug!(receivers, "Session event published");
        }
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of an [`EventBroadcaster`].
#[derive(Debug)]
pub struct EventReceiver {
    inner: broadcast::Receiver<SessionEvent>,
}

impl EventReceiver {
    /// Waits for the next event.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Closed`] once the broadcaster is gone and
    /// [`EventError::Lagged`] if events were dropped for this receiver.
    pub async fn recv(&mut self) -> Result<SessionEvent, EventError> {
        self.inner.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => EventError::Closed,
            broadcast::error::RecvError::Lagged(count) => {
                warn!(skipped = count, "Event receiver lagged");
                EventError::Lagged(count)
            }
        })
    }

    /// Returns the next event if one is already queued.
    #[must_use]
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        self.inner.try_recv().ok()
    }
}
