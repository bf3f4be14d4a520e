//! Registry API authentication.
//!
//! # Purpose
//! Groups HS256 token handling and the bearer check every protected handler
//! runs before reaching the registry.
pub mod guard;
pub mod token;

pub use guard::{extract_bearer, require_bearer};
pub use token::{RegistryClaims, TokenError, TokenVerifier};
