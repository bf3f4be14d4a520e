//! Role API handlers.
use crate::api::error::ApiError;
use crate::api::parse_uuid;
use crate::api::types::RoleListResponse;
use crate::app::AppState;
use crate::auth::require_bearer;
use crate::model::Role;
use crate::registry::{RoleCreateRequest, RoleUpdateRequest};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/api/v1/roles",
    tag = "roles",
    responses((status = 200, description = "All roles", body = RoleListResponse))
)]
pub(crate) async fn list_roles(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RoleListResponse>, ApiError> {
    require_bearer(&state, &headers)?;
    let items = state.registry.find_roles().await?;
    Ok(Json(RoleListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/api/v1/roles",
    tag = "roles",
    request_body = RoleCreateRequest,
    responses(
        (status = 201, description = "Role created, or the existing role with that name", body = Role),
        (status = 400, description = "Missing name", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RoleCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_bearer(&state, &headers)?;
    let Json(body) = payload?;
    let role = state.registry.add_role(body).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    get,
    path = "/api/v1/roles/route/{routeId}",
    tag = "roles",
    params(("routeId" = String, Path, description = "Route identifier")),
    responses((status = 200, description = "Roles permitted on the route", body = RoleListResponse))
)]
pub(crate) async fn roles_for_route(
    Path(route_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RoleListResponse>, ApiError> {
    require_bearer(&state, &headers)?;
    let route_id = parse_uuid(&route_id, "routeId")?;
    let items = state.registry.roles_for_route(route_id).await?;
    Ok(Json(RoleListResponse { items }))
}

#[utoipa::path(
    put,
    path = "/api/v1/roles/{roleId}",
    tag = "roles",
    params(("roleId" = String, Path, description = "Role identifier")),
    request_body = RoleUpdateRequest,
    responses(
        (status = 200, description = "Role renamed", body = Role),
        (status = 404, description = "Role not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Name taken", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_role(
    Path(role_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RoleUpdateRequest>, JsonRejection>,
) -> Result<Json<Role>, ApiError> {
    require_bearer(&state, &headers)?;
    let role_id = parse_uuid(&role_id, "roleId")?;
    let Json(body) = payload?;
    let role = state.registry.update_role(role_id, body).await?;
    Ok(Json(role))
}

#[utoipa::path(
    delete,
    path = "/api/v1/roles/{roleId}",
    tag = "roles",
    params(("roleId" = String, Path, description = "Role identifier")),
    responses((status = 204, description = "Role and its edges deleted, or already absent"))
)]
pub(crate) async fn delete_role(
    Path(role_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    require_bearer(&state, &headers)?;
    let role_id = parse_uuid(&role_id, "roleId")?;
    state.registry.delete_role(role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
