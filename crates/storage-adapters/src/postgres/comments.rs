//! Data mapping between the `comments` table and the domain `Comment`.

use async_trait::async_trait;
use domains::{
    Comment, CommentId, CommentPatch, CommentRepository, DomainError, Result, WriteGuard,
};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use super::db_error;

/// Every read joins the author so `author_name` is filled in.
const SELECT_COMMENT: &str = "SELECT c.id, c.content, c.author_id, u.username AS author_name, \
     c.parent_id, c.created_at, c.updated_at, c.deleted_at \
     FROM comments c LEFT JOIN users u ON u.id = c.author_id";

pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn comment_from_row(row: &PgRow) -> std::result::Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        author_id: row.try_get("author_id")?,
        author_name: row.try_get("author_name")?,
        parent_id: row.try_get("parent_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

fn comments_from_rows(rows: Vec<PgRow>) -> Result<Vec<Comment>> {
    rows.iter()
        .map(comment_from_row)
        .collect::<std::result::Result<_, _>>()
        .map_err(db_error)
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn insert(&self, comment: Comment) -> Result<Comment> {
        sqlx::query(
            "INSERT INTO comments (id, content, author_id, parent_id, created_at, updated_at, deleted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(comment.id)
        .bind(&comment.content)
        .bind(comment.author_id)
        .bind(comment.parent_id)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .bind(comment.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        self.find_by_id(comment.id)
            .await?
            .ok_or_else(|| DomainError::internal("inserted comment vanished"))
    }

    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>> {
        let row = sqlx::query(&format!("{SELECT_COMMENT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.as_ref()
            .map(comment_from_row)
            .transpose()
            .map_err(db_error)
    }

    async fn find_active(&self) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COMMENT} WHERE c.deleted_at IS NULL ORDER BY c.created_at DESC, c.id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        comments_from_rows(rows)
    }

    async fn find_replies(&self, parent_id: CommentId) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COMMENT} WHERE c.parent_id = $1 AND c.deleted_at IS NULL \
             ORDER BY c.created_at ASC, c.id ASC"
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        comments_from_rows(rows)
    }

    /// Compare-and-set update: the WHERE clause re-checks the owner and the
    /// deletion state observed by the caller, so a stale read cannot
    /// overwrite a concurrent transition.
    async fn apply(
        &self,
        id: CommentId,
        guard: WriteGuard,
        patch: CommentPatch,
    ) -> Result<Comment> {
        let (content, deleted_at) = match &patch {
            CommentPatch::Edit { content, .. } => (Some(content.as_str()), guard.deleted_at),
            CommentPatch::SoftDelete { at } => (None, Some(*at)),
            CommentPatch::Restore { .. } => (None, None),
        };

        let result = sqlx::query(
            "UPDATE comments \
             SET content = COALESCE($4, content), deleted_at = $5, updated_at = $6 \
             WHERE id = $1 AND author_id = $2 AND deleted_at IS NOT DISTINCT FROM $3",
        )
        .bind(id)
        .bind(guard.author_id)
        .bind(guard.deleted_at)
        .bind(content)
        .bind(deleted_at)
        .bind(patch.at())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return match self.find_by_id(id).await? {
                None => Err(DomainError::not_found("comment", id)),
                Some(_) => Err(DomainError::conflict(format!(
                    "comment {id} changed since it was read"
                ))),
            };
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("comment", id))
    }
}
