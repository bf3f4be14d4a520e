//! HTTP API response types.
//!
//! # Purpose
//! Defines the response envelopes of the registry REST API and the OpenAPI
//! schemas for them. Request bodies live in [`crate::registry::requests`].
use crate::model::{Rbac, Role, Route};
use crate::registry::{ReconcileOutcome, ReconcileStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
    pub backend: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RouteListResponse {
    pub items: Vec<Route>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RoleListResponse {
    pub items: Vec<Role>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RbacListResponse {
    pub items: Vec<Rbac>,
}

/// Result of a reconcile pass.
///
/// `status` is `complete` or `stale_not_cleared`. `deactivated` is set only
/// for `complete`, `stale_error` only for `stale_not_cleared`.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ReconcileResponse {
    pub service: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_error: Option<String>,
    pub items: Vec<Route>,
}

impl From<ReconcileOutcome> for ReconcileResponse {
    fn from(outcome: ReconcileOutcome) -> Self {
        let status = outcome.status.as_str().to_string();
        let (deactivated, stale_error) = match outcome.status {
            ReconcileStatus::Complete { deactivated } => (Some(deactivated), None),
            ReconcileStatus::StaleNotCleared { reason } => (None, Some(reason)),
        };
        Self {
            service: outcome.service,
            status,
            deactivated,
            stale_error,
            items: outcome.routes,
        }
    }
}
