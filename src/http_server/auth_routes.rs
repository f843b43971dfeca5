//! Auth HTTP Routes
//!
//! Self-service registration, login and profile endpoints.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, patch, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::errors::ApiResult;
use super::extract::CurrentUser;
use super::server::AppState;
use crate::auth::api::{ChangePasswordRequest, LoginRequest, ProfileUpdate, RegisterRequest};
use crate::auth::User;

/// Auth routes with shared state
pub fn auth_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/me", get(me_handler))
        .route("/profile", patch(profile_handler))
        .route("/password", patch(password_handler))
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    pub expires_in: i64,
}

async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let (user, token) = state.auth.register(request).await?;
    let response = AuthResponse {
        user,
        token,
        expires_in: state.auth.jwt().ttl_seconds(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (user, token) = state.auth.login(request).await?;
    Ok(Json(AuthResponse {
        user,
        token,
        expires_in: state.auth.jwt().ttl_seconds(),
    }))
}

async fn me_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
) -> ApiResult<Json<User>> {
    Ok(Json(state.auth.get_user(caller.id).await?))
}

async fn profile_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.auth.update_profile(caller.id, update).await?))
}

async fn password_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<Json<Value>> {
    state.auth.change_password(caller.id, request).await?;
    Ok(Json(json!({ "message": "Password updated" })))
}
