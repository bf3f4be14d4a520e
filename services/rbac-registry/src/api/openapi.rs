//! OpenAPI schema aggregation for the registry API.
//!
//! # Purpose
//! Collects all routes and schema types into a single OpenAPI document for docs
//! and client generation.
use crate::api::{
    rbac, roles, routes, system,
    types::{
        ErrorResponse, HealthStatus, RbacListResponse, ReconcileResponse, RoleListResponse,
        RouteListResponse,
    },
};
use crate::model::{Rbac, Role, Route};
use crate::registry::{
    RbacRequest, RoleCreateRequest, RoleUpdateRequest, RouteCreateRequest, RouteSubmission,
    RouteUpdateRequest,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "rbac-registry",
        version = "v1",
        description = "Route registry and role-based access control API"
    ),
    paths(
        system::system_health,
        routes::list_routes,
        routes::create_route,
        routes::routes_for_role,
        routes::reconcile_service,
        routes::mark_active,
        routes::update_route,
        routes::delete_route,
        roles::list_roles,
        roles::create_role,
        roles::roles_for_route,
        roles::update_role,
        roles::delete_role,
        rbac::list_rbac,
        rbac::create_rbac,
        rbac::delete_rbac
    ),
    components(schemas(
        HealthStatus,
        ErrorResponse,
        Route,
        Role,
        Rbac,
        RouteCreateRequest,
        RouteUpdateRequest,
        RouteSubmission,
        RoleCreateRequest,
        RoleUpdateRequest,
        RbacRequest,
        RouteListResponse,
        RoleListResponse,
        RbacListResponse,
        ReconcileResponse
    )),
    tags(
        (name = "system", description = "Health endpoints"),
        (name = "routes", description = "Route registry and reconciliation"),
        (name = "roles", description = "Role management"),
        (name = "rbac", description = "Role-to-route permission edges")
    )
)]
pub struct ApiDoc;
