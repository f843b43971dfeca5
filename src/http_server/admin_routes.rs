//! User Administration HTTP Routes
//!
//! Superadmin-only. Demoting or deleting the last superadmin is refused.

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::errors::ApiResult;
use super::extract::CurrentUser;
use super::server::AppState;
use crate::auth::admin::{CreateUserRequest, UserQuery};
use crate::auth::api::ProfileUpdate;
use crate::auth::{Role, User};
use crate::store::Page;

/// Admin routes with shared state
pub fn admin_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users", get(list_users_handler).post(create_user_handler))
        .route(
            "/users/:id",
            get(get_user_handler)
                .patch(update_user_handler)
                .delete(delete_user_handler),
        )
        .route("/users/:id/role", patch(set_role_handler))
        .route("/users/:id/password", patch(reset_password_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct PasswordReset {
    pub password: String,
}

async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Page<User>>> {
    caller.require_superadmin()?;
    Ok(Json(state.users.list(&query).await?))
}

async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    caller.require_superadmin()?;
    let user = state.users.create(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    caller.require_superadmin()?;
    Ok(Json(state.users.get(id).await?))
}

async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    caller.require_superadmin()?;
    Ok(Json(state.users.update_profile(id, update).await?))
}

async fn set_role_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    Json(change): Json<RoleChange>,
) -> ApiResult<Json<User>> {
    caller.require_superadmin()?;
    Ok(Json(state.users.set_role(id, change.role).await?))
}

async fn reset_password_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    Json(reset): Json<PasswordReset>,
) -> ApiResult<Json<Value>> {
    caller.require_superadmin()?;
    state.users.reset_password(id, &reset.password).await?;
    Ok(Json(json!({ "message": "Password updated" })))
}

async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    caller.require_superadmin()?;
    let user = state.users.delete(id).await?;
    Ok(Json(json!({ "message": "User deleted", "id": user.id })))
}
