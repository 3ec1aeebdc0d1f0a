//! Request DTOs for the document API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::models::Document;

/// Maximum accepted document text length in bytes
pub const MAX_TEXT_LENGTH: usize = 512 * 1024;

/// Request body for storing a document (PUT and POST /documents)
///
/// # Fields
/// - `id`: The document identifier, must be non-zero
/// - `text`: The document text
/// - `ttl`: Optional TTL in seconds (uses the cache default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRequest {
    /// The document identifier
    pub id: u64,
    /// The document text
    #[serde(default)]
    pub text: String,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u32>,
}

impl DocumentRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.text.len() > MAX_TEXT_LENGTH {
            return Some(format!(
                "Text exceeds maximum length of {} bytes",
                MAX_TEXT_LENGTH
            ));
        }
        None
    }

    pub fn to_document(&self) -> Document {
        Document::new(self.id, self.text.clone())
    }
}
