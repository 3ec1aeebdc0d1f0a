//! API Handlers
//!
//! HTTP request handlers for the document cache endpoints. Cache calls block
//! on the store, so each one runs on the blocking thread pool.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::cache::{CacheRegistry, LockableCache};
use crate::config::Settings;
use crate::error::{CacheError, Result};
use crate::models::{
    AddResponse, DeleteResponse, Document, DocumentConfig, DocumentRequest, DocumentResponse,
    HealthResponse, LockResponse, SetResponse, DOCUMENT_CACHE,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The registry the document cache was built from
    pub registry: Arc<CacheRegistry>,
    /// Cache for [`Document`] entities
    pub documents: Arc<LockableCache<Document>>,
}

impl AppState {
    /// Creates a new AppState, registering the document cache in `registry`.
    pub fn new(registry: Arc<CacheRegistry>, config: DocumentConfig) -> Result<Self> {
        registry.register::<Document, _>(DOCUMENT_CACHE, config);
        let documents = registry.cache::<Document>(DOCUMENT_CACHE)?;
        Ok(Self {
            registry,
            documents,
        })
    }

    /// Creates a new AppState from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let registry = Arc::new(CacheRegistry::new(settings.clone()));
        Self::new(registry, DocumentConfig::from_settings(settings))
    }
}

/// Runs a blocking cache call off the async executor.
async fn blocking<T, F>(state: &AppState, call: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&LockableCache<Document>) -> Result<T> + Send + 'static,
{
    let documents = Arc::clone(&state.documents);
    tokio::task::spawn_blocking(move || call(&documents))
        .await
        .map_err(|e| CacheError::Internal(format!("cache task failed: {}", e)))?
}

fn validated(req: &DocumentRequest) -> Result<Document> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    Ok(req.to_document())
}

/// Handler for PUT /documents
///
/// Stores a document, overwriting any cached copy.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<DocumentRequest>,
) -> Result<Json<SetResponse>> {
    let document = validated(&req)?;
    let ttl = req.ttl;

    let stored = blocking(&state, move |cache| cache.set(&document, None, ttl)).await?;

    Ok(Json(SetResponse::new(req.id, stored)))
}

/// Handler for POST /documents
///
/// Stores a document only if it is not cached yet.
pub async fn add_handler(
    State(state): State<AppState>,
    Json(req): Json<DocumentRequest>,
) -> Result<(StatusCode, Json<AddResponse>)> {
    let document = validated(&req)?;
    let ttl = req.ttl;

    let added = blocking(&state, move |cache| cache.add(&document, None, ttl)).await?;

    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::CONFLICT
    };
    Ok((status, Json(AddResponse::new(req.id, added))))
}

/// Handler for GET /documents/:id
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<DocumentResponse>> {
    let found = blocking(&state, move |cache| {
        let mut document = Document::with_id(id);
        Ok(cache.get(&mut document, None)?.cloned())
    })
    .await?;

    found
        .map(|document| Json(DocumentResponse::from(document)))
        .ok_or_else(|| CacheError::NotFound(format!("document {}", id)))
}

/// Handler for DELETE /documents/:id
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<DeleteResponse>> {
    let deleted =
        blocking(&state, move |cache| cache.delete(&Document::with_id(id), None)).await?;

    Ok(Json(DeleteResponse::new(id, deleted)))
}

/// Handler for POST /documents/:id/lock
///
/// Responds `locked: true` whether the lock was taken now or already held.
pub async fn lock_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<LockResponse>> {
    blocking(&state, move |cache| cache.lock(&Document::with_id(id))).await?;

    Ok(Json(LockResponse::locked(id)))
}

/// Handler for DELETE /documents/:id/lock
pub async fn unlock_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<LockResponse>> {
    blocking(&state, move |cache| cache.unlock(&Document::with_id(id))).await?;

    Ok(Json(LockResponse::unlocked(id)))
}

/// Handler for GET /health
///
/// Reports whether the store answers a liveness check.
pub async fn health_handler(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let reachable = blocking(&state, |cache| cache.ping()).await?;
    Ok(Json(HealthResponse::new(reachable)))
}
