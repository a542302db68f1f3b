//! Filegate Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! The synchronous half of the upload pipeline: everything between "raw bytes
//! plus a document type" and "a typed batch ready for a sink".
//!
//! ```text
//! bytes ──parse──▶ ParsedGrid ──validate──▶ ParsedGrid ──normalize──▶ NormalizedBatch
//! ```
//!
//! - [`parser`]: CSV / XLSX / XLS bytes into a rectangular grid
//! - [`profile`]: declarative per-document-type rules and the built-in registry
//! - [`validator`]: strict header contract checks
//! - [`normalizer`]: column selection, renaming, type coercion, context injection
//! - [`payload`]: JSON bodies for the remote pricing API
//!
//! Nothing here performs I/O; delivery to the remote API or the database is
//! the server's job.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashMap;
//! use filegate_ingest::{normalizer, parser, validator, ProfileRegistry};
//!
//! fn check(bytes: &[u8]) -> Result<(), filegate_ingest::IngestError> {
//!     let registry = ProfileRegistry::builtin();
//!     let profile = registry.get("price")?;
//!     let params = HashMap::from([("api_id".to_string(), "42".to_string())]);
//!
//!     let context = normalizer::bind_context(profile, &params)?;
//!     let grid = parser::parse(bytes, "prices.csv")?;
//!     validator::validate(&grid, profile)?;
//!     let batch = normalizer::normalize(&grid, profile, &context)?;
//!     assert_eq!(batch.columns, vec!["offer_id", "price"]);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod grid;
pub mod normalizer;
pub mod parser;
pub mod payload;
pub mod profile;
pub mod record;
pub mod validator;

pub use error::{IngestError, IngestResult};
pub use grid::{CellValue, ParsedGrid};
pub use profile::{DocumentProfile, ProfileRegistry, SinkTarget};
pub use record::{FieldValue, NormalizedBatch, NormalizedRecord};
