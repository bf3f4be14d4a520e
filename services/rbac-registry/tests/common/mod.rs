use rbac_registry::app::{AppState, build_router};
use rbac_registry::auth::TokenVerifier;
use rbac_registry::registry::Registry;
use rbac_registry::store::memory::InMemoryStore;
use std::sync::Arc;
use std::time::Duration;

pub type TestApp = axum::routing::RouterIntoService<axum::body::Body, ()>;

pub const TEST_SECRET: &str = "test-secret";

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

/// Router over a fresh in-memory store with bearer auth disabled.
pub fn open_app() -> TestApp {
    let registry = Arc::new(Registry::new(Arc::new(InMemoryStore::new())));
    let state = AppState::new("rbac", registry, None);
    build_router(state, &["http://localhost:3000".to_string()]).into_service()
}

/// Router with bearer auth enabled, plus a valid token for it.
pub fn secured_app() -> (TestApp, String) {
    let verifier = TokenVerifier::from_secret(TEST_SECRET, 0).expect("verifier");
    let token = verifier
        .mint("tests", Duration::from_secs(300))
        .expect("mint");
    let registry = Arc::new(Registry::new(Arc::new(InMemoryStore::new())));
    let state = AppState::new("rbac", registry, Some(Arc::new(verifier)));
    let app = build_router(state, &["http://localhost:3000".to_string()]).into_service();
    (app, token)
}
