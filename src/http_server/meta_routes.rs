//! Catalog HTTP Routes
//!
//! Divisions, screens and form definition publishing.

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::errors::ApiResult;
use super::extract::CurrentUser;
use super::server::AppState;
use crate::forms::{DivisionRemoval, ScreenRemoval};
use crate::store::{Division, FormDefinition, Screen};

/// Meta routes with shared state
pub fn meta_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/divisions", post(create_division_handler).get(list_divisions_handler))
        .route("/divisions/:id", delete(delete_division_handler))
        .route("/screens", post(create_screen_handler).get(list_screens_handler))
        .route("/screens/:id", delete(delete_screen_handler))
        .route("/form-definitions", post(publish_handler))
        .route(
            "/form-definitions/:division_id/:screen_id",
            get(active_definition_handler),
        )
        .route(
            "/form-definitions/:division_id/:screen_id/versions",
            get(definition_history_handler),
        )
        .with_state(state)
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct NewDivision {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct NewScreen {
    pub key: String,
    pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub division_id: Uuid,
    pub screen_id: Uuid,
    pub schema: Value,
    #[serde(default)]
    pub ui_schema: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct Deletion<T> {
    pub message: &'static str,
    pub id: Uuid,
    pub removed: T,
}

// ==================
// Divisions
// ==================

async fn create_division_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Json(request): Json<NewDivision>,
) -> ApiResult<(StatusCode, Json<Division>)> {
    caller.require_superadmin()?;
    let division = state
        .catalog
        .create_division(&request.name, &request.code)
        .await?;
    Ok((StatusCode::CREATED, Json(division)))
}

async fn list_divisions_handler(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
) -> ApiResult<Json<Vec<Division>>> {
    Ok(Json(state.catalog.list_divisions().await?))
}

async fn delete_division_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Deletion<DivisionRemoval>>> {
    caller.require_superadmin()?;
    let removed = state.catalog.delete_division(id).await?;
    Ok(Json(Deletion {
        message: "Division deleted",
        id,
        removed,
    }))
}

// ==================
// Screens
// ==================

async fn create_screen_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Json(request): Json<NewScreen>,
) -> ApiResult<(StatusCode, Json<Screen>)> {
    caller.require_superadmin()?;
    let screen = state
        .catalog
        .create_screen(&request.key, &request.title)
        .await?;
    Ok((StatusCode::CREATED, Json(screen)))
}

async fn list_screens_handler(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
) -> ApiResult<Json<Vec<Screen>>> {
    Ok(Json(state.catalog.list_screens().await?))
}

async fn delete_screen_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Deletion<ScreenRemoval>>> {
    caller.require_superadmin()?;
    let removed = state.catalog.delete_screen(id).await?;
    Ok(Json(Deletion {
        message: "Screen deleted",
        id,
        removed,
    }))
}

// ==================
// Form definitions
// ==================

async fn publish_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Json(request): Json<PublishRequest>,
) -> ApiResult<(StatusCode, Json<FormDefinition>)> {
    caller.require_superadmin()?;
    state
        .catalog
        .ensure_pair(request.division_id, request.screen_id)
        .await?;

    let definition = state
        .versions
        .publish(
            request.division_id,
            request.screen_id,
            request.schema,
            request.ui_schema.unwrap_or_else(|| Value::Object(Default::default())),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(definition)))
}

/// Active definition or `null`. Admin tooling: any signed-in caller, no access gate.
async fn active_definition_handler(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
    Path((division_id, screen_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Option<FormDefinition>>> {
    Ok(Json(state.versions.get_active(division_id, screen_id).await?))
}

async fn definition_history_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    Path((division_id, screen_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Vec<FormDefinition>>> {
    caller.require_superadmin()?;
    Ok(Json(state.versions.history(division_id, screen_id).await?))
}
