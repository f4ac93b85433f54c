use async_trait::async_trait;
use dashmap::DashMap;
use domains::{Notification, NotificationId, NotificationRepository, Result, UserId};

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    rows: DashMap<NotificationId, Notification>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert(&self, notification: Notification) -> Result<Notification> {
        self.rows.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn find_by_id(&self, id: NotificationId) -> Result<Option<Notification>> {
        Ok(self.rows.get(&id).map(|n| n.value().clone()))
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Notification>> {
        let mut inbox: Vec<Notification> = self
            .rows
            .iter()
            .filter(|n| n.user_id == user_id)
            .map(|n| n.value().clone())
            .collect();
        inbox.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(inbox)
    }

    async fn count_unread(&self, user_id: UserId) -> Result<u64> {
        let unread = self
            .rows
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count();
        Ok(unread as u64)
    }

    async fn mark_read(&self, id: NotificationId) -> Result<()> {
        if let Some(mut n) = self.rows.get_mut(&id) {
            n.is_read = true;
        }
        Ok(())
    }

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64> {
        let mut flipped = 0;
        for mut n in self.rows.iter_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }
}
