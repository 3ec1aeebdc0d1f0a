//! Error types for the lockable cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for key derivation, store access and locking.
///
/// Store-level misses and "already exists" outcomes are not errors; they are
/// reported as `Ok(None)` / `Ok(false)` by the operations that produce them.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Connect was attempted with an empty server list
    #[error("No server pairs provided: config={0}")]
    NoServerPairsProvided(String),

    /// A `host:port` entry could not be parsed
    #[error("Invalid server pairing: {0}")]
    InvalidServerPairing(String),

    /// The configured driver name has no implementation
    #[error("Unknown driver: {0}")]
    UnknownDriver(String),

    /// No config was registered under the requested cache name
    #[error("Unknown cache: {0}")]
    UnknownCache(String),

    /// The entity is not a shape the config derives keys for
    #[error("Invalid entity: expected {expected}, found {found}")]
    InvalidEntity { expected: String, found: String },

    /// An identifying field is unset or holds a value that cannot form a key
    #[error("Invalid field value: {field}={value}")]
    InvalidFieldValue { field: String, value: String },

    /// Increment step must be strictly positive
    #[error("Invalid increment step: {0}, must be greater than 0")]
    InvalidIncrementStep(i64),

    /// Key rejected before reaching the store
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The store could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// The store answered with something we could not interpret
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Entity body could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Entity not present in the cache
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns true for errors that only a configuration change can fix.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            CacheError::NoServerPairsProvided(_)
                | CacheError::InvalidServerPairing(_)
                | CacheError::UnknownDriver(_)
                | CacheError::UnknownCache(_)
        )
    }

    /// Returns true for failures talking to the store, which a caller may retry.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, CacheError::Connection(_) | CacheError::Protocol(_))
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Connection(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidEntity { .. }
            | CacheError::InvalidFieldValue { .. }
            | CacheError::InvalidIncrementStep(_)
            | CacheError::InvalidKey(_)
            | CacheError::InvalidRequest(_)
            | CacheError::Serialization(_) => StatusCode::BAD_REQUEST,
            CacheError::Connection(_) | CacheError::Protocol(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the lockable cache.
pub type Result<T> = std::result::Result<T, CacheError>;
