use filegate_ingest::{DocumentProfile, NormalizedBatch, SinkTarget};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::sink::{RecordSink, SinkError};

/// Outcome of delivering one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReceipt {
    pub sink: &'static str,
    pub records: usize,
    /// False when the batch was empty or a best-effort delivery failed
    pub delivered: bool,
    /// Rows removed by the dedup pass; `None` when it did not run or failed
    pub duplicates_removed: Option<u64>,
}

/// Routes a batch to the sink named by its profile
#[derive(Clone)]
pub struct SinkDispatcher {
    remote: Arc<dyn RecordSink>,
    table: Arc<dyn RecordSink>,
}

impl SinkDispatcher {
    pub fn new(remote: Arc<dyn RecordSink>, table: Arc<dyn RecordSink>) -> Self {
        Self { remote, table }
    }

    fn sink_for(&self, target: &SinkTarget) -> &Arc<dyn RecordSink> {
        match target {
            SinkTarget::Remote { .. } => &self.remote,
            SinkTarget::Table { .. } => &self.table,
        }
    }

    #[instrument(skip_all, fields(document_type = %profile.document_type, records = batch.len()))]
    pub async fn dispatch(
        &self,
        batch: &NormalizedBatch,
        profile: &DocumentProfile,
    ) -> Result<DispatchReceipt, SinkError> {
        let target = &profile.sink;
        let sink = self.sink_for(target);
        let mut receipt = DispatchReceipt {
            sink: sink.kind(),
            records: batch.len(),
            delivered: false,
            duplicates_removed: None,
        };

        if batch.is_empty() {
            info!("Empty batch, nothing to deliver");
            return Ok(receipt);
        }

        match sink.deliver(batch, target).await {
            Ok(_) => receipt.delivered = true,
            Err(e) if profile.best_effort => {
                warn!(error = %e, "Best-effort delivery failed, upload kept");
                return Ok(receipt);
            },
            Err(e) => return Err(e),
        }

        if let SinkTarget::Table { .. } = target {
            receipt.duplicates_removed = match sink.dedupe(target).await {
                Ok(removed) => Some(removed),
                Err(e) => {
                    warn!(error = %e, "Dedup pass failed");
                    None
                },
            };
        }

        Ok(receipt)
    }
}
