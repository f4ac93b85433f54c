//! # Domain Models
//!
//! These structs represent the core entities of threadline.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CommentId = Uuid;
pub type UserId = Uuid;
pub type NotificationId = Uuid;

/// A persisted comment row. Replies are never stored on the record itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub author_id: UserId,
    /// Username of the author, resolved by the store when it loads the row
    pub author_name: Option<String>,
    /// `None` for root comments; never changes after creation
    pub parent_id: Option<CommentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present iff the comment is soft-deleted
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn new(
        content: impl Into<String>,
        author_id: UserId,
        parent_id: Option<CommentId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            content: content.into(),
            author_id,
            author_name: None,
            parent_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Input for creating a comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    pub parent_id: Option<CommentId>,
    pub author_id: UserId,
}

/// A comment placed in the reply forest returned by `listAll`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub is_deleted: bool,
    /// Recomputed on every read; cached values are never trusted
    pub can_edit: bool,
    pub can_restore: bool,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn new(comment: Comment, replies: Vec<CommentNode>) -> Self {
        Self {
            is_deleted: comment.is_deleted(),
            comment,
            can_edit: false,
            can_restore: false,
            replies,
        }
    }
}

// Replies are detached into a flat work list so dropping a deep thread never
// recurses once per level.
impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

/// A single comment with its parent and direct replies, as returned by
/// `getById` and every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub is_deleted: bool,
    pub can_edit: bool,
    pub can_restore: bool,
    pub parent: Option<Comment>,
    pub replies: Vec<Comment>,
}

/// Precondition for a guarded write: the row must still belong to `author_id`
/// and still carry the `deleted_at` value observed when it was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteGuard {
    pub author_id: UserId,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl WriteGuard {
    pub fn observed(comment: &Comment) -> Self {
        Self {
            author_id: comment.author_id,
            deleted_at: comment.deleted_at,
        }
    }

    pub fn holds_for(&self, comment: &Comment) -> bool {
        comment.author_id == self.author_id && comment.deleted_at == self.deleted_at
    }
}

/// The field changes a lifecycle transition applies to a stored comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentPatch {
    Edit { content: String, at: DateTime<Utc> },
    SoftDelete { at: DateTime<Utc> },
    Restore { at: DateTime<Utc> },
}

impl CommentPatch {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Edit { at, .. } | Self::SoftDelete { at } | Self::Restore { at } => *at,
        }
    }

    /// Applies the patch in place. Used by stores that hold rows in memory.
    pub fn apply_to(&self, comment: &mut Comment) {
        match self {
            Self::Edit { content, .. } => comment.content = content.clone(),
            Self::SoftDelete { at } => comment.deleted_at = Some(*at),
            Self::Restore { .. } => comment.deleted_at = None,
        }
        comment.updated_at = self.at();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Reply,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reply => "reply",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "reply" => Some(Self::Reply),
            _ => None,
        }
    }
}

/// Event handed to the notification dispatcher when a reply is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyEvent {
    pub recipient_id: UserId,
    pub comment_id: CommentId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
}

/// A persisted inbox entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub comment_id: CommentId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_event(event: ReplyEvent, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: event.recipient_id,
            comment_id: event.comment_id,
            kind: event.kind,
            message: event.message,
            is_read: false,
            created_at: now,
        }
    }
}

/// A registered account. The password hash never leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The profile fields safe to hand to any client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// The authenticated caller, resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Result of a successful register or login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: PublicUser,
}
