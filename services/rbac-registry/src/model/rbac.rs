//! Permission edge model.
//!
//! # Purpose
//! An `Rbac` edge grants one role permission to invoke one route. Its identity
//! is the `(route_id, role_id)` pair; there are no other attributes.
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct Rbac {
    pub route_id: Uuid,
    pub role_id: Uuid,
}
