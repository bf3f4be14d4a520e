//! Route API handlers.
//!
//! # Purpose
//! Route CRUD, role-to-route lookups, and the two reconcile endpoints.
//!
//! # Security considerations
//! `POST routes/{service}` and `POST routes/mark-active` are how services
//! register themselves, so they skip the bearer check. Every other handler
//! here requires a valid bearer token when auth is configured.
use crate::api::error::ApiError;
use crate::api::parse_uuid;
use crate::api::types::{ReconcileResponse, RouteListResponse};
use crate::app::AppState;
use crate::auth::require_bearer;
use crate::model::Route;
use crate::registry::{RouteCreateRequest, RouteSubmission, RouteUpdateRequest};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/api/v1/routes",
    tag = "routes",
    responses(
        (status = 200, description = "All routes, active and inactive", body = RouteListResponse),
        (status = 401, description = "Missing or invalid bearer token", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_routes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RouteListResponse>, ApiError> {
    require_bearer(&state, &headers)?;
    let items = state.registry.find_routes().await?;
    Ok(Json(RouteListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/api/v1/routes",
    tag = "routes",
    request_body = RouteCreateRequest,
    responses(
        (status = 201, description = "Route stored; an existing natural key keeps its ID", body = Route),
        (status = 400, description = "Malformed body", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RouteCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_bearer(&state, &headers)?;
    let Json(body) = payload?;
    let route = state.registry.add_route(body).await?;
    Ok((StatusCode::CREATED, Json(route)))
}

#[utoipa::path(
    get,
    path = "/api/v1/routes/role/{roleId}",
    tag = "routes",
    params(("roleId" = String, Path, description = "Role identifier")),
    responses(
        (status = 200, description = "Routes the role may call", body = RouteListResponse),
        (status = 400, description = "Malformed role ID", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn routes_for_role(
    Path(role_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RouteListResponse>, ApiError> {
    require_bearer(&state, &headers)?;
    let role_id = parse_uuid(&role_id, "roleId")?;
    let items = state.registry.routes_for_role(role_id).await?;
    Ok(Json(RouteListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/api/v1/routes/{service}",
    tag = "routes",
    params(("service" = String, Path, description = "Owning service name")),
    request_body = [RouteSubmission],
    responses(
        (status = 200, description = "Submitted routes are active", body = ReconcileResponse),
        (status = 400, description = "Malformed submission", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn reconcile_service(
    Path(service): Path<String>,
    State(state): State<AppState>,
    payload: Result<Json<Vec<RouteSubmission>>, JsonRejection>,
) -> Result<Json<ReconcileResponse>, ApiError> {
    let Json(routes) = payload?;
    let outcome = state.registry.reconcile_service(&service, routes).await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/routes/mark-active",
    tag = "routes",
    responses(
        (status = 200, description = "This service's own endpoints are active", body = ReconcileResponse)
    )
)]
pub(crate) async fn mark_active(
    State(state): State<AppState>,
) -> Result<Json<ReconcileResponse>, ApiError> {
    let outcome = state
        .registry
        .reconcile_service(&state.service_name, state.own_routes())
        .await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/routes/{routeId}",
    tag = "routes",
    params(("routeId" = String, Path, description = "Route identifier")),
    request_body = RouteUpdateRequest,
    responses(
        (status = 200, description = "Route updated", body = Route),
        (status = 404, description = "Route not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Natural key taken by another route", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_route(
    Path(route_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RouteUpdateRequest>, JsonRejection>,
) -> Result<Json<Route>, ApiError> {
    require_bearer(&state, &headers)?;
    let route_id = parse_uuid(&route_id, "routeId")?;
    let Json(body) = payload?;
    let route = state.registry.update_route(route_id, body).await?;
    Ok(Json(route))
}

#[utoipa::path(
    delete,
    path = "/api/v1/routes/{routeId}",
    tag = "routes",
    params(("routeId" = String, Path, description = "Route identifier")),
    responses(
        (status = 204, description = "Route and its edges deleted, or already absent")
    )
)]
pub(crate) async fn delete_route(
    Path(route_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    require_bearer(&state, &headers)?;
    let route_id = parse_uuid(&route_id, "routeId")?;
    state.registry.delete_route(route_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
