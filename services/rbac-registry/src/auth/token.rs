//! Bearer token minting and verification for the registry API.
//!
//! # Purpose
//! Tokens are HS256 JWTs signed with a shared secret from configuration.
//! Callers that manage roles and permissions present one as
//! `Authorization: Bearer <jwt>`.
//!
//! # Key invariants
//! - Only HS256 is accepted; tokens signed with any other algorithm fail.
//! - `iss` must equal [`TOKEN_ISSUER`] and `exp` is always checked.
//! - The secret never leaves this module and is never logged.
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const TOKEN_ISSUER: &str = "rbac-registry";

/// Claims carried by registry bearer tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryClaims {
    pub iss: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug)]
pub enum TokenError {
    Jwt(jsonwebtoken::errors::Error),
    Key(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Jwt(err) => write!(f, "jwt error: {err}"),
            TokenError::Key(err) => write!(f, "key error: {err}"),
        }
    }
}

impl std::error::Error for TokenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TokenError::Jwt(err) => Some(err),
            TokenError::Key(_) => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        TokenError::Jwt(err)
    }
}

/// Signs and verifies registry tokens with one shared HS256 secret.
#[derive(Clone)]
pub struct TokenVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    leeway: u64,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn from_secret(secret: &str, leeway: u64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Key("jwt secret must not be empty".to_string()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            leeway,
        })
    }

    pub fn mint(&self, subject: &str, ttl: Duration) -> Result<String, TokenError> {
        let now = now_epoch_seconds();
        let claims = RegistryClaims {
            iss: TOKEN_ISSUER.to_string(),
            sub: subject.to_string(),
            exp: now + ttl.as_secs() as i64,
            iat: now,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    pub fn verify(&self, token: &str) -> Result<RegistryClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = self.leeway;
        let data = jsonwebtoken::decode::<RegistryClaims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_token_verifies() {
        let verifier = TokenVerifier::from_secret("s3cret", 0).expect("verifier");
        let token = verifier
            .mint("ops", Duration::from_secs(60))
            .expect("mint");
        let claims = verifier.verify(&token).expect("verify");
        assert_eq!(claims.sub, "ops");
        assert_eq!(claims.iss, TOKEN_ISSUER);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let issuer = TokenVerifier::from_secret("one", 0).expect("issuer");
        let verifier = TokenVerifier::from_secret("two", 0).expect("verifier");
        let token = issuer.mint("ops", Duration::from_secs(60)).expect("mint");
        assert!(matches!(verifier.verify(&token), Err(TokenError::Jwt(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = TokenVerifier::from_secret("s3cret", 0).expect("verifier");
        let claims = RegistryClaims {
            iss: TOKEN_ISSUER.to_string(),
            sub: "ops".to_string(),
            exp: now_epoch_seconds() - 120,
            iat: now_epoch_seconds() - 180,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"s3cret"),
        )
        .expect("encode");
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let verifier = TokenVerifier::from_secret("s3cret", 0).expect("verifier");
        let claims = RegistryClaims {
            iss: "someone-else".to_string(),
            sub: "ops".to_string(),
            exp: now_epoch_seconds() + 60,
            iat: now_epoch_seconds(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"s3cret"),
        )
        .expect("encode");
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            TokenVerifier::from_secret("", 0),
            Err(TokenError::Key(_))
        ));
    }
}
