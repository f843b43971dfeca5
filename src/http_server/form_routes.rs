//! Form HTTP Routes
//!
//! Schema retrieval, submission and listing for a (division, screen) pair.
//! Every route is gated by the caller's access grant.

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use uuid::Uuid;

use super::errors::ApiResult;
use super::extract::CurrentUser;
use super::server::AppState;
use crate::forms::SubmissionReceipt;
use crate::store::{FormDefinition, Page, Submission, SubmissionQuery};

/// Form routes with shared state
pub fn form_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/:division_id/:screen_id/schema", get(schema_handler))
        .route("/:division_id/:screen_id/submit", post(submit_handler))
        .route("/:division_id/:screen_id/submissions", get(submissions_handler))
        .with_state(state)
}

/// Active definition or `null`
async fn schema_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path((division_id, screen_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Option<FormDefinition>>> {
    Ok(Json(state.forms.schema(&caller, division_id, screen_id).await?))
}

async fn submit_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path((division_id, screen_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<SubmissionReceipt>)> {
    let receipt = state
        .forms
        .submit(&caller, division_id, screen_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn submissions_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path((division_id, screen_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<SubmissionQuery>,
) -> ApiResult<Json<Page<Submission>>> {
    Ok(Json(
        state
            .forms
            .submissions(&caller, division_id, screen_id, &query)
            .await?,
    ))
}
