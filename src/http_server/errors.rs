//! HTTP error mapping
//!
//! Every subsystem error becomes an [`ApiError`] rendered as
//! `{ "error", "code", "status", "violations"? }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::auth::AuthError;
use crate::forms::FormError;
use crate::schema::Violation;

/// JSON error body
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<Violation>>,
}

/// Error returned by every handler
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: u16, code: &'static str, message: String) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            body: ErrorResponse {
                error: message,
                code,
                status: status.as_u16(),
                violations: None,
            },
        }
    }

    /// 400 with a caller-facing message
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, "DIVFORMS_INVALID_INPUT", message.into())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.body.code
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::new(err.status_code(), err.code(), err.to_string())
    }
}

impl From<FormError> for ApiError {
    fn from(err: FormError) -> Self {
        let mut api = Self::new(err.status_code(), err.code(), err.to_string());
        if let FormError::ValidationFailed { violations, .. } = err {
            api.body.error = "Validation error".to_string();
            api.body.violations = Some(violations);
        }
        api
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = self.body.code, error = %self.body.error, "request failed");
        }
        (self.status, Json(self.body)).into_response()
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;
