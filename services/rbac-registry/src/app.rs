//! Registry HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Live endpoint table
//! [`LIVE_ENDPOINTS`] lists every `(method, path)` this service mounts. It is
//! fixed at compile time, copied into [`AppState`] once, and is what
//! `POST routes/mark-active` reconciles under the service's own name. The
//! persisted registry is owned by the store; nothing here mutates it.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::auth::TokenVerifier;
use crate::observability;
use crate::registry::{Registry, RouteSubmission};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

pub const API_PREFIX: &str = "/api/v1";

/// One mounted endpoint, path relative to [`API_PREFIX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub method: &'static str,
    pub path: &'static str,
}

impl Endpoint {
    const fn new(method: &'static str, path: &'static str) -> Self {
        Self { method, path }
    }
}

pub const LIVE_ENDPOINTS: &[Endpoint] = &[
    Endpoint::new("GET", "/system/health"),
    Endpoint::new("GET", "/routes"),
    Endpoint::new("POST", "/routes"),
    Endpoint::new("GET", "/routes/role/{roleId}"),
    Endpoint::new("POST", "/routes/mark-active"),
    Endpoint::new("POST", "/routes/{service}"),
    Endpoint::new("PUT", "/routes/{routeId}"),
    Endpoint::new("DELETE", "/routes/{routeId}"),
    Endpoint::new("GET", "/roles"),
    Endpoint::new("POST", "/roles"),
    Endpoint::new("GET", "/roles/route/{routeId}"),
    Endpoint::new("PUT", "/roles/{roleId}"),
    Endpoint::new("DELETE", "/roles/{roleId}"),
    Endpoint::new("GET", "/rbac"),
    Endpoint::new("POST", "/rbac"),
    Endpoint::new("DELETE", "/rbac"),
];

#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    pub registry: Arc<Registry>,
    pub endpoints: Arc<[Endpoint]>,
    pub auth: Option<Arc<TokenVerifier>>,
}

impl AppState {
    pub fn new(
        service_name: impl Into<String>,
        registry: Arc<Registry>,
        auth: Option<Arc<TokenVerifier>>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            registry,
            endpoints: Arc::from(LIVE_ENDPOINTS),
            auth,
        }
    }

    /// The live endpoint table as a reconcile submission, full paths included.
    pub fn own_routes(&self) -> Vec<RouteSubmission> {
        self.endpoints
            .iter()
            .map(|endpoint| {
                RouteSubmission::new(endpoint.method, format!("{API_PREFIX}{}", endpoint.path))
            })
            .collect()
    }
}

pub fn build_router(state: AppState, cors_allowed_origins: &[String]) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route(
            "/api/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route(
            "/api/v1/routes",
            axum::routing::get(api::routes::list_routes).post(api::routes::create_route),
        )
        .route(
            "/api/v1/routes/role/:role_id",
            axum::routing::get(api::routes::routes_for_role),
        )
        .route(
            "/api/v1/routes/mark-active",
            axum::routing::post(api::routes::mark_active),
        )
        .route(
            "/api/v1/routes/:key",
            axum::routing::post(api::routes::reconcile_service)
                .put(api::routes::update_route)
                .delete(api::routes::delete_route),
        )
        .route(
            "/api/v1/roles",
            axum::routing::get(api::roles::list_roles).post(api::roles::create_role),
        )
        .route(
            "/api/v1/roles/route/:route_id",
            axum::routing::get(api::roles::roles_for_route),
        )
        .route(
            "/api/v1/roles/:role_id",
            axum::routing::put(api::roles::update_role).delete(api::roles::delete_role),
        )
        .route(
            "/api/v1/rbac",
            axum::routing::get(api::rbac::list_rbac)
                .post(api::rbac::create_rbac)
                .delete(api::rbac::delete_rbac),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs")
                .url("/api/v1/openapi.json", ApiDoc::openapi()),
        )
        .layer(cors_layer(cors_allowed_origins))
        .layer(trace_layer)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
        .max_age(Duration::from_secs(12 * 60 * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    fn state() -> AppState {
        let registry = Arc::new(Registry::new(Arc::new(InMemoryStore::new())));
        AppState::new("rbac", registry, None)
    }

    #[test]
    fn own_routes_carry_the_api_prefix() {
        let routes = state().own_routes();
        assert_eq!(routes.len(), LIVE_ENDPOINTS.len());
        assert!(routes.iter().all(|route| route.path.starts_with("/api/v1/")));
        assert!(
            routes
                .iter()
                .any(|route| route.method == "POST" && route.path == "/api/v1/routes/mark-active")
        );
    }

    #[test]
    fn endpoint_table_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for endpoint in LIVE_ENDPOINTS {
            assert!(
                seen.insert((endpoint.method, endpoint.path)),
                "duplicate endpoint {} {}",
                endpoint.method,
                endpoint.path
            );
        }
    }

    #[tokio::test]
    async fn mark_active_source_reconciles_cleanly() {
        let state = state();
        let outcome = state
            .registry
            .reconcile_service(&state.service_name, state.own_routes())
            .await
            .expect("reconcile");
        assert_eq!(outcome.routes.len(), LIVE_ENDPOINTS.len());
        assert!(outcome.routes.iter().all(|route| route.service == "rbac"));
    }
}
