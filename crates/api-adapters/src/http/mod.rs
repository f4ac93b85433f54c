//! # HTTP surface
//!
//! Axum router over the services. Every route except register, login,
//! `/healthz` and `/metrics` requires a bearer token.

mod auth;
mod comments;
mod error;
mod extract;
mod middleware;
mod notifications;
mod ops;

use axum::routing::{get, patch, post};
use axum::Router;
use services::{AuthService, CommentService, NotificationService};
use std::sync::Arc;

use crate::metrics::ApiMetrics;

pub use error::ApiError;
pub use extract::AuthUser;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub comments: Arc<CommentService>,
    pub notifications: Arc<NotificationService>,
    pub auth: Arc<AuthService>,
    pub metrics: Arc<ApiMetrics>,
}

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/profile", get(auth::profile))
        .route("/comments", post(comments::create).get(comments::list))
        .route(
            "/comments/{id}",
            get(comments::get_one)
                .patch(comments::update)
                .delete(comments::remove),
        )
        .route("/comments/{id}/restore", post(comments::restore))
        .route("/notifications", get(notifications::list))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/mark-all-read", patch(notifications::mark_all_read))
        .route("/notifications/{id}/read", patch(notifications::mark_read))
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .with_state(state);

    middleware::standard(routes)
}
