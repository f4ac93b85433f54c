//! # NotificationService
//!
//! Read side of reply notifications: a user's inbox, its unread count and
//! the read markers. Writes arrive through the notification dispatcher.

use domains::{DomainError, Notification, NotificationId, NotificationRepository, Result, UserId};
use std::sync::Arc;
use tracing::info;

pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }

    /// The user's notifications, newest first.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Notification>> {
        self.notifications.list_for_user(user_id).await
    }

    pub async fn unread_count(&self, user_id: UserId) -> Result<u64> {
        self.notifications.count_unread(user_id).await
    }

    /// Marks one notification as read. Marking an already-read entry is a no-op.
    pub async fn mark_read(&self, id: NotificationId, user_id: UserId) -> Result<Notification> {
        let mut notification = self
            .notifications
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("notification", id))?;

        if notification.user_id != user_id {
            return Err(DomainError::forbidden(
                "you can only mark your own notifications",
            ));
        }

        if !notification.is_read {
            self.notifications.mark_read(id).await?;
            notification.is_read = true;
        }
        Ok(notification)
    }

    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64> {
        let updated = self.notifications.mark_all_read(user_id).await?;
        info!(%user_id, updated, "notifications marked read");
        Ok(updated)
    }
}
