//! Entity store contract for the registry.
//!
//! # Purpose
//! Defines the [`RegistryStore`] trait implemented by the in-memory and
//! Postgres backends. Every method is a single round-trip to the backend; there
//! is no client-side caching.
//!
//! # Key invariants
//! - `(method, path, service)` is unique across routes; [`RegistryStore::add_route`]
//!   resolves on it with an insert-or-update, never a check-then-insert.
//! - Role names are unique.
//! - Deleting a route or role removes every `Rbac` edge that references it.
//! - Deletes of unknown IDs and re-adds of present edges are no-op successes.
//! - Existence probes surface backend faults as errors; they never report
//!   `false` on failure.
//!
//! # Ordering
//! Route lists are ordered by `path`, then `method`, then `service`. Role lists
//! are ordered by `name`. Edge lists are ordered by `(route_id, role_id)`.
use crate::model::{Rbac, Role, Route};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn route_exists(&self, id: Uuid) -> StoreResult<bool>;
    async fn role_exists(&self, id: Uuid) -> StoreResult<bool>;

    /// Upsert on the natural key and return the stored row.
    ///
    /// A new row is inserted as submitted. An existing row keeps its ID and has
    /// its `active` flag overwritten with the submitted value.
    async fn add_route(&self, route: Route) -> StoreResult<Route>;
    /// Overwrite every field of the route with `route.id`.
    ///
    /// Fails with `NotFound` for an unknown ID and `Conflict` when the new
    /// natural key belongs to a different row.
    async fn update_route(&self, route: Route) -> StoreResult<Route>;
    async fn find_routes(&self) -> StoreResult<Vec<Route>>;
    async fn find_routes_by_role(&self, role_id: Uuid) -> StoreResult<Vec<Route>>;
    async fn find_routes_by_service(&self, service: &str) -> StoreResult<Vec<Route>>;
    /// Mark every route of `service` inactive and return how many rows matched.
    async fn set_routes_inactive(&self, service: &str) -> StoreResult<u64>;
    async fn delete_route(&self, id: Uuid) -> StoreResult<()>;

    /// Insert a role, or return the stored role when the name is taken.
    async fn add_role(&self, role: Role) -> StoreResult<Role>;
    /// Rename a role. `NotFound` for an unknown ID, `Conflict` on a taken name.
    async fn update_role(&self, role: Role) -> StoreResult<Role>;
    async fn find_roles(&self) -> StoreResult<Vec<Role>>;
    async fn find_roles_by_route(&self, route_id: Uuid) -> StoreResult<Vec<Role>>;
    async fn delete_role(&self, id: Uuid) -> StoreResult<()>;

    async fn add_rbac(&self, edge: Rbac) -> StoreResult<()>;
    async fn delete_rbac(&self, edge: Rbac) -> StoreResult<()>;
    async fn find_all_rbac(&self) -> StoreResult<Vec<Rbac>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}

pub(crate) fn sort_routes(routes: &mut [Route]) {
    routes.sort_by(|a, b| {
        a.path
            .cmp(&b.path)
            .then_with(|| a.method.cmp(&b.method))
            .then_with(|| a.service.cmp(&b.service))
    });
}

pub(crate) fn sort_roles(roles: &mut [Role]) {
    roles.sort_by(|a, b| a.name.cmp(&b.name));
}
