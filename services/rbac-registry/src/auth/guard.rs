//! Per-handler bearer checks.
//!
//! Handlers that manage the registry call [`require_bearer`] before touching
//! state. When no secret is configured the check is a no-op, which is only
//! meant for local development.
use crate::api::error::{ApiError, api_unauthorized};
use crate::app::AppState;
use crate::auth::token::RegistryClaims;
use axum::http::HeaderMap;

/// Returns the verified claims, or `None` when authentication is disabled.
pub fn require_bearer(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<RegistryClaims>, ApiError> {
    let Some(verifier) = state.auth.as_ref() else {
        return Ok(None);
    };
    let bearer = extract_bearer(headers).ok_or_else(|| api_unauthorized("missing bearer token"))?;
    let claims = verifier.verify(bearer).map_err(|err| {
        tracing::debug!(error = %err, "bearer token rejected");
        api_unauthorized("invalid token")
    })?;
    Ok(Some(claims))
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?;
    let value = value.to_str().ok()?;
    value.strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::http::header::AUTHORIZATION;

    #[test]
    fn extract_bearer_requires_scheme() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer(&headers).is_none());
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer(&headers).is_none());
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_bearer(&headers), Some("abc"));
    }
}
