//! Route-registry reconciliation.
//!
//! # Purpose
//! Lets an owning service declare "this is my complete current route set" and
//! converges the registry to it without touching routes of other services.
//!
//! # Algorithm
//! 1. Validate the service name and every submitted route; force each route's
//!    `service` to the owning service.
//! 2. Mark every stored route of the service inactive. A failure here is
//!    logged and reported in the outcome, but the pass continues.
//! 3. Upsert each submitted route as active, keyed on `(method, path, service)`.
//!    An existing row keeps its stored ID, so its permission edges stay valid.
//!    The first failed upsert aborts the pass; routes upserted before it stay
//!    active.
//! 4. Read back the service's routes and return the active ones.
//!
//! # Concurrency
//! A pass holds an async mutex keyed by service name from step 2 to the end,
//! so two submissions for one service never interleave. Passes for different
//! services run concurrently. A service's mutex is dropped from the map once no
//! pass holds or awaits it. The sweep and the upserts are still separate
//! statements, so readers can observe a partially applied pass.
use crate::model::Route;
use crate::observability::{RECONCILE_ROUTES, RECONCILE_TOTAL};
use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::requests::{RouteSubmission, validate_service};
use crate::store::{RegistryStore, sort_routes};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// How far a reconcile pass got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileStatus {
    /// Stale routes were cleared and the submission is active.
    Complete { deactivated: u64 },
    /// The submission is active but the deactivation sweep failed, so routes
    /// the service no longer exposes may still be marked active.
    StaleNotCleared { reason: String },
}

impl ReconcileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileStatus::Complete { .. } => "complete",
            ReconcileStatus::StaleNotCleared { .. } => "stale_not_cleared",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub service: String,
    pub status: ReconcileStatus,
    /// Routes of the service active after the pass, ordered by path then method.
    /// Includes stale routes when the sweep failed.
    pub routes: Vec<Route>,
}

pub struct Reconciler {
    store: Arc<dyn RegistryStore + Send + Sync>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn RegistryStore + Send + Sync>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    fn service_lock(&self, service: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(service.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn reconcile(
        &self,
        service: &str,
        submitted: Vec<RouteSubmission>,
    ) -> RegistryResult<ReconcileOutcome> {
        let service = validate_service(service)?;
        let mut seen = HashSet::new();
        let mut routes = Vec::with_capacity(submitted.len());
        for submission in submitted {
            let route = submission.into_active_route(&service)?;
            // First occurrence of a natural key wins.
            if seen.insert((route.method.clone(), route.path.clone())) {
                routes.push(route);
            }
        }
        metrics::histogram!(RECONCILE_ROUTES).record(routes.len() as f64);

        let lock = self.service_lock(&service);
        let result = {
            let _guard = lock.lock().await;
            self.apply(&service, routes).await
        };
        drop(lock);
        // Only the map still holds the mutex once no pass is running or queued.
        self.locks.remove_if(&service, |_, held| Arc::strong_count(held) == 1);
        result
    }

    async fn apply(&self, service: &str, routes: Vec<Route>) -> RegistryResult<ReconcileOutcome> {
        let status = match self.store.set_routes_inactive(service).await {
            Ok(deactivated) => ReconcileStatus::Complete { deactivated },
            Err(err) => {
                tracing::warn!(
                    service = %service,
                    error = %err,
                    "failed to deactivate stale routes; continuing with activation"
                );
                ReconcileStatus::StaleNotCleared {
                    reason: err.to_string(),
                }
            }
        };

        let mut upserted = Vec::with_capacity(routes.len());
        for route in routes {
            match self.store.add_route(route).await {
                Ok(stored) => upserted.push(stored),
                Err(err) => {
                    metrics::counter!(RECONCILE_TOTAL, "outcome" => "failed").increment(1);
                    tracing::error!(
                        service = %service,
                        applied = upserted.len(),
                        error = %err,
                        "route upsert failed; aborting reconcile"
                    );
                    return Err(RegistryError::from(err));
                }
            }
        }

        let active: Vec<Route> = match self.store.find_routes_by_service(service).await {
            Ok(stored) => stored.into_iter().filter(|route| route.active).collect(),
            Err(err) => {
                tracing::warn!(
                    service = %service,
                    error = %err,
                    "failed to read back active routes; returning upserted rows"
                );
                sort_routes(&mut upserted);
                upserted
            }
        };

        metrics::counter!(RECONCILE_TOTAL, "outcome" => status.as_str()).increment(1);
        tracing::info!(
            service = %service,
            routes = active.len(),
            outcome = status.as_str(),
            "service routes reconciled"
        );
        Ok(ReconcileOutcome {
            service: service.to_string(),
            status,
            routes: active,
        })
    }
}
