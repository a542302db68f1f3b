//! Feature modules implementing the Filegate API
//!
//! Each feature is a vertical slice with its own commands, queries and
//! routes.
//!
//! # Features
//!
//! - **files**: the file registry (`/files`, `/templates`, `/client-files`)
//! - **uploads**: document ingestion (`/uploads/...`) and the profile listing
//!
//! # Architecture
//!
//! - `commands/` - write operations, one `handle` function per command
//! - `queries/` - read operations
//! - `routes.rs` - HTTP handlers and the mapping of errors to responses

pub mod files;
pub mod shared;
pub mod uploads;

use crate::ingest::IngestService;
use crate::storage::BlobStore;
use axum::Router;
use std::sync::Arc;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool for file metadata
    pub db: sqlx::PgPool,
    /// Blob store holding file contents
    pub storage: Arc<dyn BlobStore>,
    /// Upload pipeline with its configured sinks
    pub ingest: Arc<IngestService>,
}

/// All feature routes, still expecting [`FeatureState`]
pub fn router() -> Router<FeatureState> {
    Router::new()
        .merge(files::files_routes())
        .merge(uploads::uploads_routes())
}
