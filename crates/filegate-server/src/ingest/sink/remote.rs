use anyhow::Context;
use async_trait::async_trait;
use filegate_ingest::{payload::remote_payload, NormalizedBatch, SinkTarget};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::{RecordSink, SinkError};

/// Posts batches as JSON to the pricing API. One request per batch, no retries.
#[derive(Clone)]
pub struct RemoteApiSink {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteApiSink {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build pricing API client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl RecordSink for RemoteApiSink {
    fn kind(&self) -> &'static str {
        "remote"
    }

    #[instrument(skip(self, batch, target), fields(document_type = %batch.document_type, records = batch.len()))]
    async fn deliver(
        &self,
        batch: &NormalizedBatch,
        target: &SinkTarget,
    ) -> Result<u64, SinkError> {
        let SinkTarget::Remote { path, shape } = target else {
            return Err(SinkError::Misrouted {
                sink: self.kind(),
                target: target.kind(),
            });
        };

        let url = self.endpoint(path);
        let body = remote_payload(batch, shape);
        debug!(%url, "Posting batch to pricing API");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SinkError::Remote {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "Pricing API rejected batch");
            return Err(SinkError::Remote {
                status: Some(status.as_u16()),
                message: if text.trim().is_empty() {
                    status.to_string()
                } else {
                    text
                },
            });
        }

        info!(%url, records = batch.len(), "Batch delivered to pricing API");
        Ok(batch.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_slashes() {
        let sink = RemoteApiSink::new("http://apps0:4446/", Duration::from_secs(1))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(sink.endpoint("/prices"), "http://apps0:4446/prices");
        assert_eq!(sink.endpoint("margins"), "http://apps0:4446/margins");
    }
}
