//! Best-effort user notifications.
//!
//! A [`Notifier`] subscribes to the [`EventBus`](crate::domain::EventBus)
//! and forwards a short text for every event that has one to an external
//! messaging endpoint. Delivery failures are logged and dropped; they never
//! affect the ledger.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::domain::{LedgerEvent, UserId};

/// Body posted to the messaging endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// Recipient.
    pub user_id: UserId,
    /// Message text.
    pub message: String,
}

impl Notification {
    /// Builds the notification for `event`, if the event warrants one.
    #[must_use]
    pub fn from_event(event: &LedgerEvent) -> Option<Self> {
        event.notification_message().map(|message| Self {
            user_id: event.user_id(),
            message,
        })
    }
}

/// HTTP client for the messaging endpoint.
#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl Notifier {
    /// Creates a notifier posting to `url`, with an optional bearer token.
    #[must_use]
    pub fn new(client: reqwest::Client, url: String, token: Option<String>) -> Self {
        Self { client, url, token }
    }

    /// Posts a single notification.
    ///
    /// # Errors
    ///
    /// Returns the transport error, or a status error for a non-2xx reply.
    pub async fn send(&self, notification: &Notification) -> Result<(), reqwest::Error> {
        let mut req = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(notification);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req.send().await?.error_for_status()?;
        Ok(())
    }

    /// Drains `rx` until the bus closes, sending a notification for every
    /// event that has a message.
    pub async fn run(self, mut rx: broadcast::Receiver<LedgerEvent>) {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let Some(notification) = Notification::from_event(&event) else {
                        continue;
                    };
                    if let Err(err) = self.send(&notification).await {
                        tracing::warn!(
                            user_id = %notification.user_id,
                            event_type = event.event_type_str(),
                            error = %err,
                            "notification dropped"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "notifier lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("notifier stopped");
    }
}
