//! # Lifecycle Policy
//!
//! Pure checks over a comment snapshot and an injected "now". Nothing here
//! reads a clock or touches a port; the service turns the returned errors
//! into user-facing failures.

use chrono::{DateTime, Duration, Utc};
use domains::{Comment, DomainError, Result, UserId};

/// Default length of both the edit and the restore window.
pub const DEFAULT_WINDOW_SECS: i64 = 15 * 60;

/// Longest accepted comment body, in characters.
pub const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// How long after creation a comment may be edited
    pub edit_window: Duration,
    /// How long after deletion a comment may be restored
    pub restore_window: Duration,
    pub max_content_chars: usize,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            edit_window: Duration::seconds(DEFAULT_WINDOW_SECS),
            restore_window: Duration::seconds(DEFAULT_WINDOW_SECS),
            max_content_chars: MAX_CONTENT_CHARS,
        }
    }
}

impl LifecyclePolicy {
    /// True iff the comment is active and still inside its edit window.
    pub fn can_edit(&self, comment: &Comment, now: DateTime<Utc>) -> bool {
        !comment.is_deleted() && now - comment.created_at <= self.edit_window
    }

    /// True iff the comment is deleted and still inside its restore window.
    pub fn can_restore(&self, comment: &Comment, now: DateTime<Utc>) -> bool {
        match comment.deleted_at {
            Some(deleted_at) => now - deleted_at <= self.restore_window,
            None => false,
        }
    }

    pub fn can_reply_to(&self, parent: &Comment) -> bool {
        !parent.is_deleted()
    }

    pub fn assert_owner(&self, comment: &Comment, user_id: UserId) -> Result<()> {
        if comment.author_id != user_id {
            return Err(DomainError::forbidden(
                "you can only modify your own comments",
            ));
        }
        Ok(())
    }

    pub fn validate_content(&self, content: &str) -> Result<()> {
        let len = content.chars().count();
        if len == 0 {
            return Err(DomainError::validation("comment content must not be empty"));
        }
        if len > self.max_content_chars {
            return Err(DomainError::validation(format!(
                "comment content must be at most {} characters",
                self.max_content_chars
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn comment_at(created_at: DateTime<Utc>) -> Comment {
        Comment::new("body", Uuid::now_v7(), None, created_at)
    }

    #[test]
    fn test_edit_window_boundary() {
        let policy = LifecyclePolicy::default();
        let t0 = Utc::now();
        let c = comment_at(t0);

        assert!(policy.can_edit(&c, t0 + Duration::minutes(15) - Duration::seconds(1)));
        assert!(policy.can_edit(&c, t0 + Duration::minutes(15)));
        assert!(!policy.can_edit(&c, t0 + Duration::minutes(15) + Duration::seconds(1)));
    }

    #[test]
    fn test_deleted_comment_is_never_editable() {
        let policy = LifecyclePolicy::default();
        let t0 = Utc::now();
        let mut c = comment_at(t0);
        c.deleted_at = Some(t0);
        assert!(!policy.can_edit(&c, t0));
    }

    #[test]
    fn test_restore_window_is_relative_to_deletion() {
        let policy = LifecyclePolicy::default();
        let t0 = Utc::now();
        let mut c = comment_at(t0);
        assert!(!policy.can_restore(&c, t0));

        let deleted_at = t0 + Duration::hours(2);
        c.deleted_at = Some(deleted_at);
        assert!(policy.can_restore(&c, deleted_at + Duration::minutes(15) - Duration::seconds(1)));
        assert!(!policy.can_restore(&c, deleted_at + Duration::minutes(15) + Duration::seconds(1)));
    }

    #[test]
    fn test_reply_only_to_active_parent() {
        let policy = LifecyclePolicy::default();
        let mut parent = comment_at(Utc::now());
        assert!(policy.can_reply_to(&parent));
        parent.deleted_at = Some(Utc::now());
        assert!(!policy.can_reply_to(&parent));
    }

    #[test]
    fn test_assert_owner() {
        let policy = LifecyclePolicy::default();
        let c = comment_at(Utc::now());
        assert!(policy.assert_owner(&c, c.author_id).is_ok());
        assert!(matches!(
            policy.assert_owner(&c, Uuid::now_v7()),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn test_content_length_counts_characters() {
        let policy = LifecyclePolicy::default();
        assert!(policy.validate_content("").is_err());
        assert!(policy.validate_content("a").is_ok());
        assert!(policy.validate_content(&"é".repeat(2000)).is_ok());
        assert!(matches!(
            policy.validate_content(&"x".repeat(2001)),
            Err(DomainError::Validation(_))
        ));
    }
}
