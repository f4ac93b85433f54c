#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use domains::{Clock, ManualClock, Notification, User, UserId, UserRepository};
use services::{CommentService, NotificationService};
use std::sync::Arc;
use storage_adapters::{
    InMemoryCommentCache, InMemoryCommentRepository, InMemoryNotificationRepository,
    InMemoryUserRepository, QueuedDispatcher,
};
use uuid::Uuid;

pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
}

/// Services over fresh in-memory adapters and a clock the test drives.
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub users: Arc<InMemoryUserRepository>,
    pub store: Arc<InMemoryCommentRepository>,
    pub cache: Arc<InMemoryCommentCache>,
    pub notifications: Arc<InMemoryNotificationRepository>,
    pub comments: CommentService,
    pub inbox: NotificationService,
}

impl Harness {
    /// Must run inside a tokio runtime; the notification worker is spawned here.
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(epoch()));
        let users = Arc::new(InMemoryUserRepository::new());
        let store = Arc::new(InMemoryCommentRepository::with_users(users.clone()));
        let cache = Arc::new(InMemoryCommentCache::new());
        let notifications = Arc::new(InMemoryNotificationRepository::new());
        let (dispatcher, _worker) =
            QueuedDispatcher::spawn(notifications.clone(), clock.clone(), 64);

        let comments = CommentService::new(
            store.clone(),
            cache.clone(),
            Arc::new(dispatcher),
            clock.clone(),
        );
        let inbox = NotificationService::new(notifications.clone());

        Self {
            clock,
            users,
            store,
            cache,
            notifications,
            comments,
            inbox,
        }
    }

    pub async fn user(&self, username: &str) -> UserId {
        let user = User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "unused".to_string(),
            created_at: self.clock.now(),
        };
        self.users.insert(user).await.unwrap().id
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Polls the inbox until `count` notifications arrived for `user`.
    pub async fn wait_for_inbox(&self, user: UserId, count: usize) -> Vec<Notification> {
        for _ in 0..100 {
            let inbox = self.inbox.list(user).await.unwrap();
            if inbox.len() >= count {
                return inbox;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("expected {count} notification(s) for {user}");
    }
}
