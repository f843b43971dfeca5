//! Access Grant HTTP Routes
//!
//! Grant management is superadmin-only; `/my-access` serves any caller.

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::errors::ApiResult;
use super::extract::CurrentUser;
use super::server::AppState;
use crate::forms::{GrantOp, GrantView};
use crate::store::AccessGrant;

/// Access routes with shared state
pub fn access_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/grant", post(grant_handler).delete(revoke_handler))
        .route("/grant/screens", patch(update_screens_handler))
        .route("/grants-by-user", get(grants_by_user_handler))
        .route("/my-access", get(my_access_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest {
    pub user_id: Uuid,
    pub division_id: Uuid,
    pub screen_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenUpdate {
    pub user_id: Uuid,
    pub division_id: Uuid,
    #[serde(default)]
    pub op: GrantOp,
    #[serde(default)]
    pub screen_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantKey {
    pub user_id: Uuid,
    pub division_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    pub user_id: Uuid,
}

/// Upsert a grant and replace its screens
async fn grant_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Json(request): Json<GrantRequest>,
) -> ApiResult<Json<Option<AccessGrant>>> {
    caller.require_superadmin()?;
    let grant = state
        .catalog
        .update_grant(request.user_id, request.division_id, GrantOp::Set, &request.screen_ids)
        .await?;
    Ok(Json(grant))
}

/// set / add / remove screens; a missing grant yields `null` for add and remove
async fn update_screens_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Json(request): Json<ScreenUpdate>,
) -> ApiResult<Json<Option<AccessGrant>>> {
    caller.require_superadmin()?;
    let grant = state
        .catalog
        .update_grant(request.user_id, request.division_id, request.op, &request.screen_ids)
        .await?;
    Ok(Json(grant))
}

async fn revoke_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Query(key): Query<GrantKey>,
) -> ApiResult<Json<Value>> {
    caller.require_superadmin()?;
    let removed = state.catalog.revoke_grant(key.user_id, key.division_id).await?;
    Ok(Json(json!({ "message": "Grant removed", "id": removed.id })))
}

async fn grants_by_user_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Query(filter): Query<UserFilter>,
) -> ApiResult<Json<Vec<GrantView>>> {
    caller.require_superadmin()?;
    Ok(Json(state.catalog.grants_for(filter.user_id).await?))
}

async fn my_access_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
) -> ApiResult<Json<Vec<GrantView>>> {
    Ok(Json(state.catalog.grants_for(caller.id).await?))
}
