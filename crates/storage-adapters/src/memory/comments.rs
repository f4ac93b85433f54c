use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{
    Comment, CommentId, CommentPatch, CommentRepository, DomainError, Result, WriteGuard,
};
use std::sync::Arc;

use super::users::InMemoryUserRepository;

/// Comment rows keyed by id.
///
/// Guarded writes run under the map's per-entry lock, so the guard check and
/// the patch cannot interleave with another write to the same comment.
#[derive(Default)]
pub struct InMemoryCommentRepository {
    rows: DashMap<CommentId, Comment>,
    /// Resolves `author_name` on load, the way the SQL adapter joins users
    users: Option<Arc<InMemoryUserRepository>>,
}

impl InMemoryCommentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            rows: DashMap::new(),
            users: Some(users),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn hydrate(&self, mut comment: Comment) -> Comment {
        if let Some(users) = &self.users {
            comment.author_name = users.username_of(comment.author_id);
        }
        comment
    }

    fn collect<F>(&self, keep: F) -> Vec<Comment>
    where
        F: Fn(&Comment) -> bool,
    {
        self.rows
            .iter()
            .filter(|row| keep(row.value()))
            .map(|row| self.hydrate(row.value().clone()))
            .collect()
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn insert(&self, comment: Comment) -> Result<Comment> {
        if let Some(parent_id) = comment.parent_id {
            if !self.rows.contains_key(&parent_id) {
                return Err(DomainError::not_found("comment", parent_id));
            }
        }
        match self.rows.entry(comment.id) {
            Entry::Occupied(_) => Err(DomainError::conflict(format!(
                "comment {} already exists",
                comment.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(comment.clone());
                Ok(self.hydrate(comment))
            }
        }
    }

    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>> {
        let row = self.rows.get(&id).map(|row| row.value().clone());
        Ok(row.map(|c| self.hydrate(c)))
    }

    async fn find_active(&self) -> Result<Vec<Comment>> {
        let mut active = self.collect(|c| !c.is_deleted());
        active.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(active)
    }

    async fn find_replies(&self, parent_id: CommentId) -> Result<Vec<Comment>> {
        let mut replies = self.collect(|c| c.parent_id == Some(parent_id) && !c.is_deleted());
        replies.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(replies)
    }

    async fn apply(
        &self,
        id: CommentId,
        guard: WriteGuard,
        patch: CommentPatch,
    ) -> Result<Comment> {
        let updated = {
            let mut row = self
                .rows
                .get_mut(&id)
                .ok_or_else(|| DomainError::not_found("comment", id))?;
            if !guard.holds_for(row.value()) {
                return Err(DomainError::conflict(format!(
                    "comment {id} changed since it was read"
                )));
            }
            patch.apply_to(row.value_mut());
            row.value().clone()
        };
        Ok(self.hydrate(updated))
    }
}
