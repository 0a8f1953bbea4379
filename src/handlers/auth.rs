use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};

use crate::error::ApiError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, UserResponse};
use crate::sessions::{self, AuthUser};
use crate::state::AppState;

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let conn = state.db.lock()?;

    let user = sessions::create_user(&conn, &payload.email, &payload.password, &payload.name)?;
    let token = sessions::create_session(&conn, &user.id, state.config.session_ttl_hours)?;

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let conn = state.db.lock()?;

    let user = sessions::verify_credentials(&conn, &payload.email, &payload.password)?;
    let token = sessions::create_session(&conn, &user.id, state.config.session_ttl_hours)?;

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    if let Some(token) = sessions::bearer_token(&headers) {
        let conn = state.db.lock()?;
        sessions::revoke_session(&conn, token)?;
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let conn = state.db.lock()?;

    let user = sessions::user_by_id(&conn, &user.id)?.ok_or(ApiError::Unauthorized)?;

    Ok(Json(UserResponse::from(user)))
}
