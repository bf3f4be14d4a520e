//! Registry HTTP API module.
//!
//! # Purpose
//! Exposes route handler modules and shared helpers for parsing path
//! identifiers.
pub mod error;
pub mod openapi;
pub mod rbac;
pub mod roles;
pub mod routes;
pub mod system;
pub mod types;

use crate::api::error::{ApiError, api_validation_error};
use uuid::Uuid;

/// Parse a textual UUID path segment, rejecting malformed input with a 400.
pub(crate) fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| api_validation_error(&format!("{field} must be a UUID")))
}
