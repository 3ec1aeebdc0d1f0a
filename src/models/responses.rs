//! Response DTOs for the document API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::models::Document;

/// Response body for GET /documents/:id
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResponse {
    pub id: u64,
    pub text: String,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            text: document.text,
        }
    }
}

/// Response body for PUT /documents
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The document that was stored
    pub id: u64,
    /// Whether the store accepted the write
    pub stored: bool,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(id: u64, stored: bool) -> Self {
        let message = if stored {
            format!("Document {} set successfully", id)
        } else {
            format!("Document {} was not stored", id)
        };
        Self {
            message,
            id,
            stored,
        }
    }
}

/// Response body for POST /documents
#[derive(Debug, Clone, Serialize)]
pub struct AddResponse {
    pub id: u64,
    /// False when the document was already cached
    pub added: bool,
}

impl AddResponse {
    pub fn new(id: u64, added: bool) -> Self {
        Self { id, added }
    }
}

/// Response body for DELETE /documents/:id
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub id: u64,
    /// False when there was nothing cached to delete
    pub deleted: bool,
}

impl DeleteResponse {
    pub fn new(id: u64, deleted: bool) -> Self {
        Self { id, deleted }
    }
}

/// Response body for the lock endpoints (POST/DELETE /documents/:id/lock)
#[derive(Debug, Clone, Serialize)]
pub struct LockResponse {
    pub id: u64,
    /// Lock state the caller asked for
    pub locked: bool,
    pub message: String,
}

impl LockResponse {
    pub fn locked(id: u64) -> Self {
        Self {
            id,
            locked: true,
            message: format!("Document {} locked", id),
        }
    }

    pub fn unlocked(id: u64) -> Self {
        Self {
            id,
            locked: false,
            message: format!("Document {} unlocked", id),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" when the store answers, "degraded" otherwise
    pub status: String,
    pub store_reachable: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn new(store_reachable: bool) -> Self {
        let status = if store_reachable { "healthy" } else { "degraded" };
        Self {
            status: status.to_string(),
            store_reachable,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
