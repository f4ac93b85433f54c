//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be wired into the binary.
//! Adapters convert their own failures into `DomainError::Internal` at this
//! boundary so services only ever see the domain taxonomy.

use crate::errors::Result;
use crate::models::{
    Comment, CommentId, CommentPatch, Identity, Notification, NotificationId, ReplyEvent, User,
    UserId, WriteGuard,
};
use async_trait::async_trait;
use std::time::Duration;

/// Persistence contract for comment rows.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Persists a new row and returns it as stored.
    async fn insert(&self, comment: Comment) -> Result<Comment>;

    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>>;

    /// All non-deleted comments, newest first.
    async fn find_active(&self) -> Result<Vec<Comment>>;

    /// Non-deleted direct replies of `parent_id`, oldest first.
    async fn find_replies(&self, parent_id: CommentId) -> Result<Vec<Comment>>;

    /// Applies `patch` only if `guard` still holds for the stored row.
    ///
    /// Fails with `NotFound` when the row is gone and `Conflict` when the
    /// guard no longer matches.
    async fn apply(&self, id: CommentId, guard: WriteGuard, patch: CommentPatch)
        -> Result<Comment>;
}

/// Key-value cache with TTL. Values are opaque serialized payloads.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Hand-off point for reply notifications.
///
/// Implementations must not wait for delivery; returning `Ok` only means the
/// event was accepted.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, event: ReplyEvent) -> Result<()>;
}

/// Persistence contract for the notification inbox.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: Notification) -> Result<Notification>;
    async fn find_by_id(&self, id: NotificationId) -> Result<Option<Notification>>;
    /// Newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Notification>>;
    async fn count_unread(&self, user_id: UserId) -> Result<u64>;
    async fn mark_read(&self, id: NotificationId) -> Result<()>;
    /// Returns how many rows flipped from unread to read.
    async fn mark_all_read(&self, user_id: UserId) -> Result<u64>;
}

/// Account storage. Usernames and emails are unique; `insert` reports
/// duplicates as `Conflict`.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: User) -> Result<User>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
}

/// Password hashing contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Access token contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, identity: &Identity) -> Result<String>;
    /// Fails with `Unauthorized` on a malformed, forged or expired token.
    fn verify(&self, token: &str) -> Result<Identity>;
}
