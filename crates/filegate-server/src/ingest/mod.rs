//! Asynchronous half of the upload pipeline
//!
//! The pure stages (parse, validate, normalize) live in `filegate_ingest`;
//! this module runs them off the async runtime and delivers the resulting
//! batch:
//!
//! - [`sink`]: the [`RecordSink`](sink::RecordSink) seam with its remote API
//!   and PostgreSQL table implementations
//! - [`dedup`]: natural-key cleanup after table inserts
//! - [`dispatcher`]: routes a batch to the sink its profile names
//! - [`pipeline`]: the per-upload service used by the HTTP handlers

pub mod dedup;
pub mod dispatcher;
pub mod pipeline;
pub mod sink;

pub use dispatcher::{DispatchReceipt, SinkDispatcher};
pub use pipeline::{GridPreview, IngestPlan, IngestReceipt, IngestService, PipelineError};
pub use sink::{RecordSink, RemoteApiSink, SinkError, TableSink};
