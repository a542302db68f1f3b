//! Document ingestion endpoints
//!
//! An upload is stored as a client file first, then run through the
//! pipeline for its document type. Requests that cannot succeed (unknown
//! document type, missing context, unsupported format) are rejected before
//! anything is stored.

pub mod routes;

pub use routes::uploads_routes;
