//! Permission edge API handlers.
use crate::api::error::ApiError;
use crate::api::types::RbacListResponse;
use crate::app::AppState;
use crate::auth::require_bearer;
use crate::registry::RbacRequest;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/api/v1/rbac",
    tag = "rbac",
    responses((status = 200, description = "All permission edges", body = RbacListResponse))
)]
pub(crate) async fn list_rbac(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RbacListResponse>, ApiError> {
    require_bearer(&state, &headers)?;
    let items = state.registry.find_all_rbac().await?;
    Ok(Json(RbacListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/api/v1/rbac",
    tag = "rbac",
    request_body = RbacRequest,
    responses(
        (status = 201, description = "Edge present", body = crate::model::Rbac),
        (status = 404, description = "Route or role does not exist", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_rbac(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RbacRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_bearer(&state, &headers)?;
    let Json(body) = payload?;
    let edge = state.registry.add_rbac(body).await?;
    Ok((StatusCode::CREATED, Json(edge)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/rbac",
    tag = "rbac",
    request_body = RbacRequest,
    responses((status = 204, description = "Edge absent"))
)]
pub(crate) async fn delete_rbac(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RbacRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    require_bearer(&state, &headers)?;
    let Json(body) = payload?;
    state.registry.delete_rbac(body).await?;
    Ok(StatusCode::NO_CONTENT)
}
