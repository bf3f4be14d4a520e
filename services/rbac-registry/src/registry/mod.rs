//! Registry facade.
//!
//! # Purpose
//! [`Registry`] is the single entry point the HTTP layer talks to. It accepts
//! the explicit request records from [`requests`], validates them, and routes
//! each call to the [`reconcile::Reconciler`] or the [`resolver::Resolver`].
//! Handlers never touch the store directly.
pub mod error;
pub mod reconcile;
pub mod requests;
pub mod resolver;

pub use error::{RegistryError, RegistryResult};
pub use reconcile::{ReconcileOutcome, ReconcileStatus, Reconciler};
pub use requests::{
    RbacRequest, RoleCreateRequest, RoleUpdateRequest, RouteCreateRequest, RouteSubmission,
    RouteUpdateRequest,
};
pub use resolver::Resolver;

use crate::model::{Rbac, Role, Route};
use crate::store::RegistryStore;
use std::sync::Arc;
use uuid::Uuid;

pub struct Registry {
    store: Arc<dyn RegistryStore + Send + Sync>,
    reconciler: Reconciler,
    resolver: Resolver,
}

impl Registry {
    pub fn new(store: Arc<dyn RegistryStore + Send + Sync>) -> Self {
        Self {
            reconciler: Reconciler::new(store.clone()),
            resolver: Resolver::new(store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn RegistryStore + Send + Sync> {
        &self.store
    }

    /// Converge the registry to `routes` as the complete route set of `service`.
    pub async fn reconcile_service(
        &self,
        service: &str,
        routes: Vec<RouteSubmission>,
    ) -> RegistryResult<ReconcileOutcome> {
        self.reconciler.reconcile(service, routes).await
    }

    pub async fn add_route(&self, request: RouteCreateRequest) -> RegistryResult<Route> {
        self.resolver.add_route(request.validate()?).await
    }

    pub async fn update_route(
        &self,
        id: Uuid,
        request: RouteUpdateRequest,
    ) -> RegistryResult<Route> {
        self.resolver.update_route(request.validate(id)?).await
    }

    pub async fn delete_route(&self, id: Uuid) -> RegistryResult<()> {
        self.resolver.delete_route(id).await
    }

    pub async fn find_routes(&self) -> RegistryResult<Vec<Route>> {
        self.resolver.find_routes().await
    }

    pub async fn routes_for_role(&self, role_id: Uuid) -> RegistryResult<Vec<Route>> {
        self.resolver.routes_for_role(role_id).await
    }

    pub async fn add_role(&self, request: RoleCreateRequest) -> RegistryResult<Role> {
        self.resolver.add_role(&request.name).await
    }

    pub async fn update_role(&self, id: Uuid, request: RoleUpdateRequest) -> RegistryResult<Role> {
        self.resolver.update_role(id, &request.name).await
    }

    pub async fn delete_role(&self, id: Uuid) -> RegistryResult<()> {
        self.resolver.delete_role(id).await
    }

    pub async fn find_roles(&self) -> RegistryResult<Vec<Role>> {
        self.resolver.find_roles().await
    }

    pub async fn roles_for_route(&self, route_id: Uuid) -> RegistryResult<Vec<Role>> {
        self.resolver.roles_for_route(route_id).await
    }

    pub async fn add_rbac(&self, request: RbacRequest) -> RegistryResult<Rbac> {
        let edge = request.validate()?;
        self.resolver.add_rbac(edge).await?;
        Ok(edge)
    }

    pub async fn delete_rbac(&self, request: RbacRequest) -> RegistryResult<()> {
        self.resolver.delete_rbac(request.validate()?).await
    }

    pub async fn find_all_rbac(&self) -> RegistryResult<Vec<Rbac>> {
        self.resolver.find_all_rbac().await
    }

    pub async fn health_check(&self) -> RegistryResult<()> {
        Ok(self.store.health_check().await?)
    }
}
