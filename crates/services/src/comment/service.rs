//! # CommentService
//!
//! Orchestrates the comment store, the lifecycle policy, the reply-tree
//! builder, the row cache and reply notifications.
//!
//! Every mutation follows the same flow: load the row, validate it against
//! the policy, write it back through a guard that re-checks the observed
//! owner and deletion state, invalidate the cache, then reload.
//!
//! The cache holds the flat list of active rows rather than the nested
//! forest; a hit rebuilds the tree in linear time. Each snapshot is tagged
//! with the generation token that was current before the rows were fetched.
//! Invalidation replaces the token, so a snapshot fetched before a mutation
//! and written after its invalidation is never served.

use chrono::{DateTime, Utc};
use domains::{
    Clock, Comment, CommentCache, CommentId, CommentNode, CommentPatch, CommentRepository,
    CommentView, DomainError, NewComment, NotificationDispatcher, NotificationKind, ReplyEvent,
    Result, UserId, WriteGuard,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::policy::LifecyclePolicy;
use super::tree;

/// Cache key holding the snapshot of active rows.
pub const ALL_COMMENTS_KEY: &str = "comments:all";

/// Suffix of the key holding the current generation token.
const GENERATION_SUFFIX: &str = ":generation";

#[derive(Debug, Serialize, Deserialize)]
struct CachedRows {
    generation: String,
    comments: Vec<Comment>,
}

#[derive(Debug, Clone)]
pub struct CommentSettings {
    pub cache_key: String,
    pub cache_ttl: Duration,
}

impl Default for CommentSettings {
    fn default() -> Self {
        Self {
            cache_key: ALL_COMMENTS_KEY.to_string(),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    cache: Arc<dyn CommentCache>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    policy: LifecyclePolicy,
    settings: CommentSettings,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        cache: Arc<dyn CommentCache>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            comments,
            cache,
            dispatcher,
            clock,
            policy: LifecyclePolicy::default(),
            settings: CommentSettings::default(),
        }
    }

    pub fn with_policy(mut self, policy: LifecyclePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_settings(mut self, settings: CommentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    /// Creates a root comment or a reply.
    #[tracing::instrument(skip(self, input), fields(author_id = %input.author_id, parent_id = ?input.parent_id))]
    pub async fn create(&self, input: NewComment) -> Result<CommentView> {
        // 1. Validation: body length
        self.policy.validate_content(&input.content)?;

        // 2. Parent: must exist and still be active right now
        let parent = match input.parent_id {
            Some(parent_id) => {
                let parent = self.load(parent_id).await?;
                if !self.policy.can_reply_to(&parent) {
                    return Err(DomainError::validation("cannot reply to deleted comment"));
                }
                Some(parent)
            }
            None => None,
        };

        // 3. Persistence
        let now = self.clock.now();
        let comment = Comment::new(input.content, input.author_id, input.parent_id, now);
        let saved = self.comments.insert(comment).await?;
        info!(comment_id = %saved.id, "comment created");

        let view = self.view(saved.id, now).await?;

        // 4. Notification: only when someone else's comment got a reply
        if let Some(parent) = parent.filter(|p| p.author_id != input.author_id) {
            self.notify_reply(&parent, &view.comment);
        }

        self.invalidate().await;
        Ok(view)
    }

    /// Returns the forest of active comments, newest root first.
    pub async fn list_all(&self) -> Result<Vec<CommentNode>> {
        let now = self.clock.now();

        // Read before the store so a concurrent invalidation is visible.
        let generation = self.current_generation().await;
        if let Some(generation) = &generation {
            if let Some(rows) = self.cached_rows(generation).await {
                return Ok(self.forest(rows, now));
            }
        }

        let rows = self.comments.find_active().await?;
        if let Some(generation) = generation {
            self.store_rows(generation, &rows).await;
        }
        Ok(self.forest(rows, now))
    }

    pub async fn get_by_id(&self, id: CommentId) -> Result<CommentView> {
        self.view(id, self.clock.now()).await
    }

    #[tracing::instrument(skip(self, content))]
    pub async fn update(
        &self,
        id: CommentId,
        content: String,
        requester_id: UserId,
    ) -> Result<CommentView> {
        let comment = self.load(id).await?;
        self.policy.assert_owner(&comment, requester_id)?;
        if comment.is_deleted() {
            return Err(DomainError::validation("cannot edit deleted comment"));
        }

        let now = self.clock.now();
        if !self.policy.can_edit(&comment, now) {
            return Err(DomainError::validation("edit window expired"));
        }
        self.policy.validate_content(&content)?;

        self.comments
            .apply(id, WriteGuard::observed(&comment), CommentPatch::Edit { content, at: now })
            .await?;
        info!(comment_id = %id, "comment edited");

        self.invalidate().await;
        self.view(id, now).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: CommentId, requester_id: UserId) -> Result<CommentView> {
        let comment = self.load(id).await?;
        self.policy.assert_owner(&comment, requester_id)?;
        if comment.is_deleted() {
            return Err(DomainError::validation("comment is already deleted"));
        }

        let now = self.clock.now();
        self.comments
            .apply(id, WriteGuard::observed(&comment), CommentPatch::SoftDelete { at: now })
            .await?;
        info!(comment_id = %id, "comment soft-deleted");

        self.invalidate().await;
        self.view(id, now).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn restore(&self, id: CommentId, requester_id: UserId) -> Result<CommentView> {
        let comment = self.load(id).await?;
        self.policy.assert_owner(&comment, requester_id)?;
        if !comment.is_deleted() {
            return Err(DomainError::validation("comment is not deleted"));
        }

        let now = self.clock.now();
        if !self.policy.can_restore(&comment, now) {
            return Err(DomainError::validation("restore window expired"));
        }

        self.comments
            .apply(id, WriteGuard::observed(&comment), CommentPatch::Restore { at: now })
            .await?;
        info!(comment_id = %id, "comment restored");

        self.invalidate().await;
        self.view(id, now).await
    }

    async fn load(&self, id: CommentId) -> Result<Comment> {
        self.comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("comment", id))
    }

    /// Reloads a comment together with its parent and active direct replies.
    async fn view(&self, id: CommentId, now: DateTime<Utc>) -> Result<CommentView> {
        let comment = self.load(id).await?;
        let parent = match comment.parent_id {
            Some(parent_id) => self.comments.find_by_id(parent_id).await?,
            None => None,
        };
        let replies = self.comments.find_replies(id).await?;

        Ok(CommentView {
            is_deleted: comment.is_deleted(),
            can_edit: self.policy.can_edit(&comment, now),
            can_restore: self.policy.can_restore(&comment, now),
            comment,
            parent,
            replies,
        })
    }

    fn notify_reply(&self, parent: &Comment, reply: &Comment) {
        let who = reply.author_name.as_deref().unwrap_or("Someone");
        let event = ReplyEvent {
            recipient_id: parent.author_id,
            comment_id: reply.id,
            kind: NotificationKind::Reply,
            message: format!("{who} replied to your comment"),
        };
        if let Err(err) = self.dispatcher.dispatch(event) {
            warn!(comment_id = %reply.id, error = %err, "reply notification not dispatched");
        }
    }

    fn forest(&self, rows: Vec<Comment>, now: DateTime<Utc>) -> Vec<CommentNode> {
        let mut forest = tree::build_forest(rows);
        debug!(
            roots = forest.len(),
            total = tree::count(&forest),
            "built comment forest"
        );
        tree::annotate(&mut forest, &self.policy, now);
        forest
    }

    fn generation_key(&self) -> String {
        format!("{}{GENERATION_SUFFIX}", self.settings.cache_key)
    }

    fn generation_ttl(&self) -> Duration {
        // Outlives any snapshot written under it.
        self.settings.cache_ttl.saturating_mul(2)
    }

    /// The token snapshots must carry to be served. `None` means the cache is
    /// unusable for this call.
    async fn current_generation(&self) -> Option<String> {
        let key = self.generation_key();
        match self.cache.get(&key).await {
            Ok(Some(generation)) => return Some(generation),
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "comment cache read failed; falling back to store");
                return None;
            }
        }
        let generation = Uuid::now_v7().to_string();
        match self
            .cache
            .set(&key, generation.clone(), self.generation_ttl())
            .await
        {
            Ok(()) => Some(generation),
            Err(err) => {
                warn!(error = %err, "could not start a comment cache generation");
                None
            }
        }
    }

    async fn cached_rows(&self, generation: &str) -> Option<Vec<Comment>> {
        let raw = match self.cache.get(&self.settings.cache_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %err, "comment cache read failed; falling back to store");
                return None;
            }
        };
        match serde_json::from_str::<CachedRows>(&raw) {
            Ok(cached) if cached.generation == generation => Some(cached.comments),
            Ok(_) => {
                debug!("cached rows predate the last invalidation");
                None
            }
            Err(err) => {
                warn!(error = %err, "discarding undecodable cached rows");
                if let Err(err) = self.cache.delete(&self.settings.cache_key).await {
                    warn!(error = %err, "comment cache delete failed");
                }
                None
            }
        }
    }

    async fn store_rows(&self, generation: String, rows: &[Comment]) {
        let payload = match serde_json::to_string(&CachedRows {
            generation,
            comments: rows.to_vec(),
        }) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "could not encode comment rows for caching");
                return;
            }
        };
        if let Err(err) = self
            .cache
            .set(&self.settings.cache_key, payload, self.settings.cache_ttl)
            .await
        {
            warn!(error = %err, "comment cache write failed");
        }
    }

    /// Starts a new generation, then drops the current snapshot.
    async fn invalidate(&self) {
        let generation = Uuid::now_v7().to_string();
        if let Err(err) = self
            .cache
            .set(&self.generation_key(), generation, self.generation_ttl())
            .await
        {
            warn!(error = %err, "comment cache generation bump failed");
        }
        if let Err(err) = self.cache.delete(&self.settings.cache_key).await {
            warn!(error = %err, "comment cache invalidation failed");
        }
    }
}
