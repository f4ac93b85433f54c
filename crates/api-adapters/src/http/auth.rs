use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use domains::{AuthSession, Credentials, PublicUser, RegisterUser};

use super::{ApiError, AppState, AuthUser};
use crate::metrics::Operation;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterUser>,
) -> Result<(StatusCode, Json<AuthSession>), ApiError> {
    let result = state.auth.register(body).await;
    state.metrics.record(Operation::Register, &result);
    Ok((StatusCode::CREATED, Json(result?)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<AuthSession>, ApiError> {
    let result = state.auth.login(body).await;
    state.metrics.record(Operation::Login, &result);
    Ok(Json(result?))
}

pub async fn profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    Ok(Json(state.auth.profile(&user).await?))
}
