//! API Module
//!
//! HTTP handlers and routing for the document cache REST API.
//!
//! # Endpoints
//! - `PUT /documents` - Store a document
//! - `POST /documents` - Store a document if absent
//! - `GET /documents/:id` - Retrieve a document
//! - `DELETE /documents/:id` - Delete a document
//! - `POST /documents/:id/lock` - Lock a document
//! - `DELETE /documents/:id/lock` - Unlock a document
//! - `GET /health` - Store liveness check

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
