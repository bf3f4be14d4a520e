//! In-memory implementation of the registry store.
//!
//! # Purpose
//! This store implements [`RegistryStore`] with `HashMap`s guarded by
//! `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - deployments where durability is not required
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: every operation runs under the write or read
//!   locks it needs, so an upsert on the natural key cannot race another upsert.
//! - Locks are always taken in the order routes, roles, rbac.
//!
//! # Performance characteristics
//! Natural-key lookups and cascades scan the maps. That is fine for development
//! workloads but would be slow for very large registries.
use super::{RegistryStore, StoreError, StoreResult, sort_roles, sort_routes};
use crate::model::{Rbac, Role, Route};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory registry store.
///
/// All maps are wrapped in `Arc<RwLock<...>>` so the store can be shared across
/// request handlers, reads proceed concurrently, and writes are serialized.
#[derive(Default)]
pub struct InMemoryStore {
    /// Routes keyed by storage ID.
    routes: Arc<RwLock<HashMap<Uuid, Route>>>,
    /// Roles keyed by storage ID.
    roles: Arc<RwLock<HashMap<Uuid, Role>>>,
    /// Permission edges, ordered by `(route_id, role_id)`.
    rbac: Arc<RwLock<BTreeSet<Rbac>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistryStore for InMemoryStore {
    async fn route_exists(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.routes.read().await.contains_key(&id))
    }

    async fn role_exists(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.roles.read().await.contains_key(&id))
    }

    async fn add_route(&self, route: Route) -> StoreResult<Route> {
        let mut routes = self.routes.write().await;
        let key = route.key();
        if let Some(existing) = routes.values_mut().find(|stored| stored.key() == key) {
            // The stored ID wins on conflict so existing edges stay valid.
            existing.active = route.active;
            return Ok(existing.clone());
        }
        if routes.contains_key(&route.id) {
            return Err(StoreError::Conflict("route id exists".into()));
        }
        routes.insert(route.id, route.clone());
        Ok(route)
    }

    async fn update_route(&self, route: Route) -> StoreResult<Route> {
        let mut routes = self.routes.write().await;
        if !routes.contains_key(&route.id) {
            return Err(StoreError::NotFound("route".into()));
        }
        let key = route.key();
        if routes
            .values()
            .any(|stored| stored.id != route.id && stored.key() == key)
        {
            return Err(StoreError::Conflict("route exists".into()));
        }
        routes.insert(route.id, route.clone());
        Ok(route)
    }

    async fn find_routes(&self) -> StoreResult<Vec<Route>> {
        let mut items: Vec<Route> = self.routes.read().await.values().cloned().collect();
        sort_routes(&mut items);
        Ok(items)
    }

    async fn find_routes_by_role(&self, role_id: Uuid) -> StoreResult<Vec<Route>> {
        let routes = self.routes.read().await;
        let rbac = self.rbac.read().await;
        let mut items: Vec<Route> = rbac
            .iter()
            .filter(|edge| edge.role_id == role_id)
            .filter_map(|edge| routes.get(&edge.route_id).cloned())
            .collect();
        sort_routes(&mut items);
        Ok(items)
    }

    async fn find_routes_by_service(&self, service: &str) -> StoreResult<Vec<Route>> {
        let mut items: Vec<Route> = self
            .routes
            .read()
            .await
            .values()
            .filter(|route| route.service == service)
            .cloned()
            .collect();
        sort_routes(&mut items);
        Ok(items)
    }

    async fn set_routes_inactive(&self, service: &str) -> StoreResult<u64> {
        let mut routes = self.routes.write().await;
        let mut matched = 0;
        for route in routes.values_mut().filter(|route| route.service == service) {
            route.active = false;
            matched += 1;
        }
        Ok(matched)
    }

    async fn delete_route(&self, id: Uuid) -> StoreResult<()> {
        let mut routes = self.routes.write().await;
        if routes.remove(&id).is_some() {
            self.rbac.write().await.retain(|edge| edge.route_id != id);
        }
        Ok(())
    }

    async fn add_role(&self, role: Role) -> StoreResult<Role> {
        let mut roles = self.roles.write().await;
        if let Some(existing) = roles.values().find(|stored| stored.name == role.name) {
            return Ok(existing.clone());
        }
        if roles.contains_key(&role.id) {
            return Err(StoreError::Conflict("role id exists".into()));
        }
        roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn update_role(&self, role: Role) -> StoreResult<Role> {
        let mut roles = self.roles.write().await;
        if !roles.contains_key(&role.id) {
            return Err(StoreError::NotFound("role".into()));
        }
        if roles
            .values()
            .any(|stored| stored.id != role.id && stored.name == role.name)
        {
            return Err(StoreError::Conflict("role exists".into()));
        }
        roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn find_roles(&self) -> StoreResult<Vec<Role>> {
        let mut items: Vec<Role> = self.roles.read().await.values().cloned().collect();
        sort_roles(&mut items);
        Ok(items)
    }

    async fn find_roles_by_route(&self, route_id: Uuid) -> StoreResult<Vec<Role>> {
        let roles = self.roles.read().await;
        let rbac = self.rbac.read().await;
        let mut items: Vec<Role> = rbac
            .iter()
            .filter(|edge| edge.route_id == route_id)
            .filter_map(|edge| roles.get(&edge.role_id).cloned())
            .collect();
        sort_roles(&mut items);
        Ok(items)
    }

    async fn delete_role(&self, id: Uuid) -> StoreResult<()> {
        let mut roles = self.roles.write().await;
        if roles.remove(&id).is_some() {
            self.rbac.write().await.retain(|edge| edge.role_id != id);
        }
        Ok(())
    }

    async fn add_rbac(&self, edge: Rbac) -> StoreResult<()> {
        // Mirror the storage-level foreign keys of the durable backend.
        let routes = self.routes.read().await;
        let roles = self.roles.read().await;
        if !routes.contains_key(&edge.route_id) {
            return Err(StoreError::NotFound("route".into()));
        }
        if !roles.contains_key(&edge.role_id) {
            return Err(StoreError::NotFound("role".into()));
        }
        self.rbac.write().await.insert(edge);
        Ok(())
    }

    async fn delete_rbac(&self, edge: Rbac) -> StoreResult<()> {
        self.rbac.write().await.remove(&edge);
        Ok(())
    }

    async fn find_all_rbac(&self) -> StoreResult<Vec<Rbac>> {
        Ok(self.rbac.read().await.iter().copied().collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
