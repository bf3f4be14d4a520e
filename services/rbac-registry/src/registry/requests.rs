//! Request records accepted by the registry facade.
//!
//! # Purpose
//! One explicit record per operation. Each is validated here, before any
//! store access, so the resolver and reconciler only ever see well-formed
//! input.
use crate::model::{Rbac, Route, normalize_method};
use crate::registry::error::{RegistryResult, validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Column widths of `routes.method`, `routes.path` and `roles.name`, in characters.
pub const MAX_METHOD_LEN: usize = 10;
pub const MAX_PATH_LEN: usize = 255;
pub const MAX_ROLE_NAME_LEN: usize = 255;

fn default_active() -> bool {
    true
}

/// Body of `POST routes`: register a single route.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RouteCreateRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub method: String,
    pub path: String,
    pub service: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl RouteCreateRequest {
    pub fn validate(self) -> RegistryResult<Route> {
        let (method, path) = validate_method_path(&self.method, &self.path)?;
        let service = validate_service(&self.service)?;
        Ok(Route {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            method,
            path,
            service,
            active: self.active,
        })
    }
}

/// Body of `PUT routes/{routeId}`: overwrite every route attribute.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RouteUpdateRequest {
    pub method: String,
    pub path: String,
    pub service: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl RouteUpdateRequest {
    pub fn validate(self, id: Uuid) -> RegistryResult<Route> {
        let (method, path) = validate_method_path(&self.method, &self.path)?;
        let service = validate_service(&self.service)?;
        Ok(Route {
            id,
            method,
            path,
            service,
            active: self.active,
        })
    }
}

/// One element of a reconcile submission (`POST routes/{service}`).
///
/// `service` and `active` are accepted for payload compatibility and ignored:
/// the owning service always comes from the request path and every submitted
/// route is activated.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RouteSubmission {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl RouteSubmission {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: None,
            method: method.into(),
            path: path.into(),
            service: None,
            active: None,
        }
    }

    /// Build the route to upsert, forcing ownership to `service`.
    pub fn into_active_route(self, service: &str) -> RegistryResult<Route> {
        let (method, path) = validate_method_path(&self.method, &self.path)?;
        Ok(Route {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            method,
            path,
            service: service.to_string(),
            active: true,
        })
    }
}

/// Body of `POST roles`.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RoleCreateRequest {
    pub name: String,
}

/// Body of `PUT roles/{roleId}`.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RoleUpdateRequest {
    pub name: String,
}

/// Body of `POST rbac` and `DELETE rbac`.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy)]
pub struct RbacRequest {
    pub route_id: Uuid,
    pub role_id: Uuid,
}

impl RbacRequest {
    pub fn validate(self) -> RegistryResult<Rbac> {
        if self.route_id.is_nil() {
            return Err(validation("route_id is required"));
        }
        if self.role_id.is_nil() {
            return Err(validation("role_id is required"));
        }
        Ok(Rbac {
            route_id: self.route_id,
            role_id: self.role_id,
        })
    }
}

pub(crate) fn validate_role_name(name: &str) -> RegistryResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(validation("role name is required"));
    }
    if name.chars().count() > MAX_ROLE_NAME_LEN {
        return Err(validation(format!(
            "role name exceeds {MAX_ROLE_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

pub(crate) fn validate_service(service: &str) -> RegistryResult<String> {
    let service = service.trim();
    if service.is_empty() {
        return Err(validation("service is required"));
    }
    Ok(service.to_string())
}

fn validate_method_path(method: &str, path: &str) -> RegistryResult<(String, String)> {
    let method = normalize_method(method);
    if method.is_empty() {
        return Err(validation("route method is required"));
    }
    if method.chars().count() > MAX_METHOD_LEN {
        return Err(validation(format!(
            "route method exceeds {MAX_METHOD_LEN} characters"
        )));
    }
    let path = path.trim();
    if path.is_empty() {
        return Err(validation("route path is required"));
    }
    if path.chars().count() > MAX_PATH_LEN {
        return Err(validation(format!(
            "route path exceeds {MAX_PATH_LEN} characters"
        )));
    }
    Ok((method, path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryError;

    #[test]
    fn submission_is_forced_onto_owning_service_and_activated() {
        let submission = RouteSubmission {
            id: None,
            method: "post".to_string(),
            path: "/orders".to_string(),
            service: Some("someone-else".to_string()),
            active: Some(false),
        };
        let route = submission.into_active_route("billing").expect("route");
        assert_eq!(route.service, "billing");
        assert_eq!(route.method, "POST");
        assert!(route.active);
        assert!(!route.id.is_nil());
    }

    #[test]
    fn submission_requires_method_and_path() {
        let err = RouteSubmission::new("", "/x")
            .into_active_route("svc")
            .expect_err("method");
        assert!(matches!(err, RegistryError::Validation(_)));
        let err = RouteSubmission::new("GET", "  ")
            .into_active_route("svc")
            .expect_err("path");
        assert!(matches!(err, RegistryError::Validation(_)));
    }

    #[test]
    fn create_request_defaults_to_active_and_generates_id() {
        let request: RouteCreateRequest = serde_json::from_value(serde_json::json!({
            "method": "get",
            "path": "/users",
            "service": "users"
        }))
        .expect("decode");
        let route = request.validate().expect("valid");
        assert!(route.active);
        assert_eq!(route.method, "GET");
        assert!(!route.id.is_nil());
    }

    #[test]
    fn create_request_requires_service() {
        let request = RouteCreateRequest {
            id: None,
            method: "GET".to_string(),
            path: "/users".to_string(),
            service: " ".to_string(),
            active: true,
        };
        assert!(matches!(
            request.validate(),
            Err(RegistryError::Validation(_))
        ));
    }

    #[test]
    fn rbac_request_rejects_nil_ids() {
        let request = RbacRequest {
            route_id: Uuid::nil(),
            role_id: Uuid::new_v4(),
        };
        assert!(matches!(
            request.validate(),
            Err(RegistryError::Validation(_))
        ));
        let request = RbacRequest {
            route_id: Uuid::new_v4(),
            role_id: Uuid::nil(),
        };
        assert!(matches!(
            request.validate(),
            Err(RegistryError::Validation(_))
        ));
    }

    #[test]
    fn role_names_are_trimmed_and_required() {
        assert_eq!(validate_role_name(" admin ").expect("name"), "admin");
        assert!(validate_role_name("").is_err());
    }

    #[test]
    fn oversized_fields_are_rejected() {
        let at_limit = format!("/{}", "x".repeat(MAX_PATH_LEN - 1));
        assert!(RouteSubmission::new("GET", at_limit).into_active_route("svc").is_ok());

        let err = RouteSubmission::new("GET", format!("/{}", "x".repeat(MAX_PATH_LEN)))
            .into_active_route("svc")
            .expect_err("path");
        assert!(matches!(err, RegistryError::Validation(ref msg) if msg.contains("path")));

        let err = RouteSubmission::new("PROPPATCHXX", "/x")
            .into_active_route("svc")
            .expect_err("method");
        assert!(matches!(err, RegistryError::Validation(ref msg) if msg.contains("method")));

        // Width is counted in characters, not bytes.
        assert!(validate_role_name(&"é".repeat(MAX_ROLE_NAME_LEN)).is_ok());
        assert!(validate_role_name(&"r".repeat(MAX_ROLE_NAME_LEN + 1)).is_err());
    }
}
