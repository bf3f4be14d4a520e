//! Role, route, and permission-edge management over a [`RegistryStore`].
//!
//! Every call is a pass-through to the store after validation. Edge creation
//! checks both endpoints first so callers get a precise "does not exist"
//! message instead of a storage-level foreign key failure.
use crate::model::{Rbac, Role, Route};
use crate::observability::EDGE_REJECTED_TOTAL;
use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::requests::validate_role_name;
use crate::store::RegistryStore;
use std::sync::Arc;
use uuid::Uuid;

pub struct Resolver {
    store: Arc<dyn RegistryStore + Send + Sync>,
}

impl Resolver {
    pub fn new(store: Arc<dyn RegistryStore + Send + Sync>) -> Self {
        Self { store }
    }

    /// Add a role by name. Re-adding an existing name returns the stored role.
    pub async fn add_role(&self, name: &str) -> RegistryResult<Role> {
        let name = validate_role_name(name)?;
        let role = self
            .store
            .add_role(Role {
                id: Uuid::new_v4(),
                name,
            })
            .await?;
        Ok(role)
    }

    pub async fn update_role(&self, id: Uuid, name: &str) -> RegistryResult<Role> {
        let name = validate_role_name(name)?;
        Ok(self.store.update_role(Role { id, name }).await?)
    }

    pub async fn delete_role(&self, id: Uuid) -> RegistryResult<()> {
        self.store.delete_role(id).await?;
        tracing::debug!(role_id = %id, "role deleted");
        Ok(())
    }

    pub async fn find_roles(&self) -> RegistryResult<Vec<Role>> {
        Ok(self.store.find_roles().await?)
    }

    pub async fn add_route(&self, route: Route) -> RegistryResult<Route> {
        Ok(self.store.add_route(route).await?)
    }

    pub async fn update_route(&self, route: Route) -> RegistryResult<Route> {
        Ok(self.store.update_route(route).await?)
    }

    pub async fn delete_route(&self, id: Uuid) -> RegistryResult<()> {
        self.store.delete_route(id).await?;
        tracing::debug!(route_id = %id, "route deleted");
        Ok(())
    }

    pub async fn find_routes(&self) -> RegistryResult<Vec<Route>> {
        Ok(self.store.find_routes().await?)
    }

    /// Grant `edge.role_id` access to `edge.route_id`. Idempotent.
    pub async fn add_rbac(&self, edge: Rbac) -> RegistryResult<()> {
        if !self.store.route_exists(edge.route_id).await? {
            metrics::counter!(EDGE_REJECTED_TOTAL, "reason" => "route_missing")
                .increment(1);
            return Err(RegistryError::NotFound("route does not exist".into()));
        }
        if !self.store.role_exists(edge.role_id).await? {
            metrics::counter!(EDGE_REJECTED_TOTAL, "reason" => "role_missing")
                .increment(1);
            return Err(RegistryError::NotFound("role does not exist".into()));
        }
        self.store.add_rbac(edge).await?;
        Ok(())
    }

    /// Revoke an edge. Removing an absent edge succeeds.
    pub async fn delete_rbac(&self, edge: Rbac) -> RegistryResult<()> {
        Ok(self.store.delete_rbac(edge).await?)
    }

    /// Routes a role may call, active or not.
    pub async fn routes_for_role(&self, role_id: Uuid) -> RegistryResult<Vec<Route>> {
        Ok(self.store.find_routes_by_role(role_id).await?)
    }

    pub async fn roles_for_route(&self, route_id: Uuid) -> RegistryResult<Vec<Role>> {
        Ok(self.store.find_roles_by_route(route_id).await?)
    }

    pub async fn find_all_rbac(&self) -> RegistryResult<Vec<Rbac>> {
        Ok(self.store.find_all_rbac().await?)
    }
}
