//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error response construction so every registry endpoint
//! returns the same error shape.
//!
//! # Key invariants and assumptions
//! - Error responses always carry a stable `code` and a human-readable `message`.
//! - Validation failures map to 400, missing entities to 404, uniqueness
//!   collisions to 409, and storage faults to 500.
//!
//! # Security considerations
//! - Storage errors are logged server-side; clients get a generic message.
use crate::api::types::ErrorResponse;
use crate::registry::RegistryError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Structured API error returned by handlers.
///
/// `status` must match the semantics of `body.code`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match &err {
            RegistryError::Validation(message) => api_validation_error(message),
            RegistryError::NotFound(message) => api_not_found(message),
            RegistryError::Conflict(message) => api_conflict("already_exists", message),
            RegistryError::Store(_) => api_internal("registry storage failure", &err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Every malformed body is a 400, including the 415/422 axum would pick.
        api_validation_error(&rejection.body_text())
    }
}

fn error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        },
    }
}

/// Build a 404 Not Found error.
pub fn api_not_found(message: &str) -> ApiError {
    error(StatusCode::NOT_FOUND, "not_found", message)
}

/// Build a 409 Conflict error with a caller-provided code.
pub fn api_conflict(code: &str, message: &str) -> ApiError {
    error(StatusCode::CONFLICT, code, message)
}

/// Build a 500 Internal Server Error from a registry error.
///
/// Logs the underlying error and returns `message` to the client.
pub fn api_internal(message: &str, err: &RegistryError) -> ApiError {
    tracing::error!(error = ?err, "registry storage error");
    error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

/// Build a 401 Unauthorized error.
pub fn api_unauthorized(message: &str) -> ApiError {
    error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

/// Build a 400 Bad Request validation error.
pub fn api_validation_error(message: &str) -> ApiError {
    error(StatusCode::BAD_REQUEST, "validation_error", message)
}
