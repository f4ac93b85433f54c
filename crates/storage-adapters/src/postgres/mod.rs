//! # PostgreSQL adapters
//!
//! Implements the repository ports on top of a `sqlx` connection pool.
//! Queries are built at runtime so the crate compiles without a database.

mod comments;
mod notifications;
mod users;

pub use comments::PgCommentRepository;
pub use notifications::PgNotificationRepository;
pub use users::PgUserRepository;

use domains::DomainError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Opens a pool and applies the embedded migrations.
pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!(max_connections, "postgres pool ready");
    Ok(pool)
}

/// Translates driver failures into the domain taxonomy. Unique violations
/// become `Conflict`; everything else is `Internal`.
pub(crate) fn db_error(err: sqlx::Error) -> DomainError {
    if let Some(db) = err.as_database_error() {
        if db.code().as_deref() == Some("23505") {
            return DomainError::conflict(db.message().to_string());
        }
    }
    tracing::error!(error = %err, "database operation failed");
    DomainError::internal(err)
}
