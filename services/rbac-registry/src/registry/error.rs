//! Registry error kinds.
//!
//! # Purpose
//! Typed failures returned by the reconciler, resolver, and facade. The HTTP
//! layer maps each kind to a status code; nothing below the facade knows
//! about HTTP.
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Missing or malformed identifier or payload field.
    #[error("{0}")]
    Validation(String),
    /// A referenced role or route does not exist.
    #[error("{0}")]
    NotFound(String),
    /// A role name or route natural key is already taken by another row.
    #[error("{0}")]
    Conflict(String),
    /// Any other storage fault, including connectivity.
    #[error("storage failure: {0}")]
    Store(StoreError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => {
                RegistryError::NotFound(format!("{entity} does not exist"))
            }
            StoreError::Conflict(entity) => RegistryError::Conflict(entity),
            other => RegistryError::Store(other),
        }
    }
}

pub(crate) fn validation(message: impl Into<String>) -> RegistryError {
    RegistryError::Validation(message.into())
}
