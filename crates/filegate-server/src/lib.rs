//! Filegate Server Library
//!
//! HTTP gateway that accepts uploaded spreadsheets, checks them against a
//! per-document-type profile and delivers the normalized rows either to the
//! pricing API or into PostgreSQL. Uploaded files are kept in S3-compatible
//! storage with their metadata in the database.
//!
//! # Layout
//!
//! - [`api`]: router assembly, `/health`, response envelopes
//! - [`features`]: the file registry and the ingestion endpoints
//! - [`ingest`]: sinks, dispatcher, dedup pass and the pipeline service
//! - [`db`], [`storage`]: PostgreSQL pool and blob store
//! - [`config`], [`middleware`]: environment configuration, CORS and tracing
//!
//! # Example
//!
//! ```no_run
//! use filegate_server::{api, config::Config};
//!
//! # async fn run(state: filegate_server::features::FeatureState) -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let app = api::create_router(state, &config);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod storage;
