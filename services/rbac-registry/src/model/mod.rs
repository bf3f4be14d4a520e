//! Registry data model module.
//!
//! # Purpose
//! Re-exports the route, role, and permission-edge records shared by the
//! store, registry, and HTTP API layers.
mod rbac;
mod role;
mod route;

pub use rbac::Rbac;
pub use role::Role;
pub use route::{Route, RouteKey, normalize_method};
