//! Route model definitions.
//!
//! # Purpose
//! Defines the route record and its natural key. A route is identified in
//! storage by an opaque UUID, but across reconciliation passes it is tracked by
//! `(method, path, service)`.
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Route {
    pub id: Uuid,
    pub method: String,
    pub path: String,
    pub service: String,
    pub active: bool,
}

impl Route {
    pub fn key(&self) -> RouteKey {
        RouteKey {
            method: self.method.clone(),
            path: self.path.clone(),
            service: self.service.clone(),
        }
    }
}

/// Natural key of a route.
///
/// Unique across all rows; upserts resolve on it and the stored ID always wins
/// on conflict.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub method: String,
    pub path: String,
    pub service: String,
}

/// Uppercase and trim an HTTP verb so `get` and `GET ` share a natural key.
pub fn normalize_method(method: &str) -> String {
    method.trim().to_ascii_uppercase()
}
