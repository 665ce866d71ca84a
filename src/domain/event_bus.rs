//! Fan-out of [`LedgerEvent`]s to background consumers.
//!
//! Services publish after each committed mutation. The notifier and the
//! event log writer each hold their own receiver, so a slow webhook never
//! delays the ledger.

use tokio::sync::broadcast;

use super::LedgerEvent;

/// Cloneable handle that publishes ledger events to every subscriber.
///
/// Capacity comes from `EVENT_BUS_CAPACITY`. A receiver that falls more
/// than `capacity` events behind skips ahead and sees `Lagged`.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    /// Opens a bus buffering up to `capacity` events (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Hands `event` to the current subscribers and returns how many there
    /// were. Zero subscribers is not an error.
    pub fn publish(&self, event: LedgerEvent) -> usize {
        tracing::debug!(
            event_type = event.event_type_str(),
            user_id = %event.user_id(),
            "ledger event"
        );
        self.sender.send(event).unwrap_or(0)
    }

    /// New receiver; sees events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }

    /// Live receivers, reported by the health endpoint.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
