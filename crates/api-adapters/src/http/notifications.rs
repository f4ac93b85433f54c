//! Inbox handlers. Each caller only ever sees their own notifications.

use axum::extract::{Path, State};
use axum::Json;
use domains::{Notification, NotificationId};
use serde_json::{json, Value};

use super::{ApiError, AppState, AuthUser};
use crate::metrics::Operation;

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(state.notifications.list(user.user_id).await?))
}

/// Bare number body, e.g. `3`.
pub async fn unread_count(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<u64>, ApiError> {
    Ok(Json(state.notifications.unread_count(user.user_id).await?))
}

pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<Notification>, ApiError> {
    let result = state.notifications.mark_read(id, user.user_id).await;
    state.metrics.record(Operation::MarkRead, &result);
    Ok(Json(result?))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let updated = state.notifications.mark_all_read(user.user_id).await?;
    Ok(Json(json!({ "updated": updated })))
}
