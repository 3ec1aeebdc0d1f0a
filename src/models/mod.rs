//! Request and Response models for the document API
//!
//! This module defines the cached document entity and the DTOs used for
//! serializing/deserializing HTTP request and response bodies.

pub mod document;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use document::{Document, DocumentConfig, DOCUMENT_CACHE};
pub use requests::DocumentRequest;
pub use responses::{
    AddResponse, DeleteResponse, DocumentResponse, ErrorResponse, HealthResponse, LockResponse,
    SetResponse,
};
