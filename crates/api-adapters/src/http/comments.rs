//! Comment handlers. The caller's identity always comes from the token,
//! never from the body.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{CommentId, CommentNode, CommentView, NewComment};
use serde::Deserialize;

use super::{ApiError, AppState, AuthUser};
use crate::metrics::Operation;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<CommentId>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentView>), ApiError> {
    let result = state
        .comments
        .create(NewComment {
            content: body.content,
            parent_id: body.parent_id,
            author_id: user.user_id,
        })
        .await;
    state.metrics.record(Operation::Create, &result);
    Ok((StatusCode::CREATED, Json(result?)))
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
) -> Result<Json<Vec<CommentNode>>, ApiError> {
    let result = state.comments.list_all().await;
    state.metrics.record(Operation::List, &result);
    Ok(Json(result?))
}

pub async fn get_one(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(id): Path<CommentId>,
) -> Result<Json<CommentView>, ApiError> {
    let result = state.comments.get_by_id(id).await;
    state.metrics.record(Operation::Get, &result);
    Ok(Json(result?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<CommentId>,
    Json(body): Json<UpdateCommentRequest>,
) -> Result<Json<CommentView>, ApiError> {
    let result = state.comments.update(id, body.content, user.user_id).await;
    state.metrics.record(Operation::Update, &result);
    Ok(Json(result?))
}

pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<CommentId>,
) -> Result<Json<CommentView>, ApiError> {
    let result = state.comments.delete(id, user.user_id).await;
    state.metrics.record(Operation::Delete, &result);
    Ok(Json(result?))
}

pub async fn restore(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<CommentId>,
) -> Result<Json<CommentView>, ApiError> {
    let result = state.comments.restore(id, user.user_id).await;
    state.metrics.record(Operation::Restore, &result);
    Ok(Json(result?))
}
