//! Delivery targets for normalized batches

use async_trait::async_trait;
use filegate_ingest::{NormalizedBatch, SinkTarget};
use thiserror::Error;

pub mod remote;
pub mod table;

pub use remote::RemoteApiSink;
pub use table::TableSink;

#[derive(Debug, Error)]
pub enum SinkError {
    /// Non-2xx answer or transport failure talking to the pricing API
    #[error("Pricing API request failed: {}", describe_remote(.status, .message))]
    Remote { status: Option<u16>, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Sink '{sink}' cannot deliver to a {target} target")]
    Misrouted {
        sink: &'static str,
        target: &'static str,
    },
}

fn describe_remote(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("status {}: {}", code, message),
        None => message.to_string(),
    }
}

impl From<sqlx::Error> for SinkError {
    fn from(err: sqlx::Error) -> Self {
        SinkError::Storage(err.to_string())
    }
}

/// A place a batch can be delivered to
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Short name reported in receipts ("remote", "table")
    fn kind(&self) -> &'static str;

    /// Deliver the whole batch; returns the number of records accepted
    async fn deliver(&self, batch: &NormalizedBatch, target: &SinkTarget)
        -> Result<u64, SinkError>;

    /// Remove rows superseded by this delivery; returns rows deleted
    async fn dedupe(&self, _target: &SinkTarget) -> Result<u64, SinkError> {
        Ok(0)
    }
}
