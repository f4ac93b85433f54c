//! # Queued notification dispatch
//!
//! `QueuedDispatcher` accepts reply events without waiting: events go into a
//! bounded channel and a background worker persists them as inbox entries.
//! A full or closed queue is reported to the caller, which logs and moves on.

use domains::{
    Clock, DomainError, Notification, NotificationDispatcher, NotificationRepository, ReplyEvent,
    Result,
};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct QueuedDispatcher {
    tx: mpsc::Sender<ReplyEvent>,
}

impl QueuedDispatcher {
    /// Spawns the delivery worker on the current runtime.
    ///
    /// The worker exits once every `QueuedDispatcher` clone has been dropped
    /// and the queue is drained.
    pub fn spawn(
        notifications: Arc<dyn NotificationRepository>,
        clock: Arc<dyn Clock>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(deliver(rx, notifications, clock));
        (Self { tx }, worker)
    }
}

impl NotificationDispatcher for QueuedDispatcher {
    fn dispatch(&self, event: ReplyEvent) -> Result<()> {
        self.tx.try_send(event).map_err(|err| match err {
            TrySendError::Full(_) => DomainError::internal("notification queue is full"),
            TrySendError::Closed(_) => DomainError::internal("notification queue is closed"),
        })
    }
}

async fn deliver(
    mut rx: mpsc::Receiver<ReplyEvent>,
    notifications: Arc<dyn NotificationRepository>,
    clock: Arc<dyn Clock>,
) {
    info!("notification worker started");
    while let Some(event) = rx.recv().await {
        let recipient = event.recipient_id;
        let notification = Notification::from_event(event, clock.now());
        match notifications.insert(notification).await {
            Ok(saved) => debug!(notification_id = %saved.id, %recipient, "notification stored"),
            Err(err) => error!(%recipient, error = %err, "failed to store notification"),
        }
    }
    info!("notification worker stopped");
}
