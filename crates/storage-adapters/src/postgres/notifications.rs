use async_trait::async_trait;
use domains::{
    DomainError, Notification, NotificationId, NotificationKind, NotificationRepository, Result,
    UserId,
};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use super::db_error;

const SELECT_NOTIFICATION: &str =
    "SELECT id, user_id, comment_id, kind, message, is_read, created_at FROM notifications";

pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn notification_from_row(row: &PgRow) -> Result<Notification> {
    let kind: String = row.try_get("kind").map_err(db_error)?;
    Ok(Notification {
        id: row.try_get("id").map_err(db_error)?,
        user_id: row.try_get("user_id").map_err(db_error)?,
        comment_id: row.try_get("comment_id").map_err(db_error)?,
        kind: NotificationKind::parse(&kind)
            .ok_or_else(|| DomainError::internal(format!("unknown notification kind {kind:?}")))?,
        message: row.try_get("message").map_err(db_error)?,
        is_read: row.try_get("is_read").map_err(db_error)?,
        created_at: row.try_get("created_at").map_err(db_error)?,
    })
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn insert(&self, notification: Notification) -> Result<Notification> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, comment_id, kind, message, is_read, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.comment_id)
        .bind(notification.kind.as_str())
        .bind(&notification.message)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(notification)
    }

    async fn find_by_id(&self, id: NotificationId) -> Result<Option<Notification>> {
        let row = sqlx::query(&format!("{SELECT_NOTIFICATION} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.as_ref().map(notification_from_row).transpose()
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Notification>> {
        let rows = sqlx::query(&format!(
            "{SELECT_NOTIFICATION} WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(notification_from_row).collect()
    }

    async fn count_unread(&self, user_id: UserId) -> Result<u64> {
        let unread: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(unread.max(0) as u64)
    }

    async fn mark_read(&self, id: NotificationId) -> Result<()> {
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(result.rows_affected())
    }
}
