//! Per-upload pipeline service
//!
//! ```text
//! plan ──▶ parse ─▶ validate ─▶ normalize ──▶ dispatch ─▶ dedupe
//!          └──────── blocking pool ───────┘
//! ```
//!
//! [`IngestService::plan`] runs before the file is stored so that unknown
//! document types and missing context are rejected without side effects.

use filegate_ingest::{
    normalizer, parser, validator, CellValue, DocumentProfile, FieldValue, IngestError,
    ProfileRegistry,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

use super::dispatcher::SinkDispatcher;
use super::sink::SinkError;

/// Default number of rows returned by [`IngestService::preview`]
pub const DEFAULT_PREVIEW_ROWS: usize = 50;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("Pipeline worker failed: {0}")]
    Worker(String),
}

/// A resolved document type with its bound context values
#[derive(Debug, Clone)]
pub struct IngestPlan {
    pub profile: DocumentProfile,
    pub context: Vec<(String, FieldValue)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    pub document_type: String,
    pub filename: String,
    pub records: usize,
    pub sink: &'static str,
    pub delivered: bool,
    pub duplicates_removed: Option<u64>,
    pub message: String,
}

/// Header and leading rows of a validated file
#[derive(Debug, Clone, Serialize)]
pub struct GridPreview {
    pub document_type: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    pub total_rows: usize,
}

pub struct IngestService {
    registry: Arc<ProfileRegistry>,
    dispatcher: SinkDispatcher,
}

impl IngestService {
    pub fn new(registry: Arc<ProfileRegistry>, dispatcher: SinkDispatcher) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    pub fn plan(
        &self,
        document_type: &str,
        params: &HashMap<String, String>,
    ) -> Result<IngestPlan, PipelineError> {
        let profile = self.registry.get(document_type)?;
        let context = normalizer::bind_context(profile, params)?;
        Ok(IngestPlan {
            profile: profile.clone(),
            context,
        })
    }

    /// Parse, validate, normalize and deliver one file.
    ///
    /// Any ingest error aborts before a sink is contacted.
    #[instrument(skip(self, plan, bytes), fields(document_type = %plan.profile.document_type, size = bytes.len()))]
    pub async fn run(
        &self,
        plan: IngestPlan,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<IngestReceipt, PipelineError> {
        let name = filename.to_string();
        let (plan, batch) = tokio::task::spawn_blocking(move || {
            let grid = parser::parse(&bytes, &name)?;
            validator::validate(&grid, &plan.profile)?;
            let batch = normalizer::normalize(&grid, &plan.profile, &plan.context)?;
            Ok::<_, IngestError>((plan, batch))
        })
        .await
        .map_err(|e| PipelineError::Worker(e.to_string()))??;

        let receipt = self.dispatcher.dispatch(&batch, &plan.profile).await?;

        info!(
            records = receipt.records,
            sink = receipt.sink,
            delivered = receipt.delivered,
            "Upload processed"
        );

        Ok(IngestReceipt {
            document_type: plan.profile.document_type.clone(),
            filename: filename.to_string(),
            records: receipt.records,
            sink: receipt.sink,
            delivered: receipt.delivered,
            duplicates_removed: receipt.duplicates_removed,
            message: format!(
                "Client file: {} is successfully saved and {} uploaded.",
                filename, plan.profile.description
            ),
        })
    }

    /// Parse and validate only; nothing is stored or delivered.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn preview(
        &self,
        document_type: &str,
        filename: &str,
        bytes: Vec<u8>,
        limit: usize,
    ) -> Result<GridPreview, PipelineError> {
        let profile = self.registry.get(document_type)?.clone();
        let name = filename.to_string();

        tokio::task::spawn_blocking(move || {
            let grid = parser::parse(&bytes, &name)?;
            validator::validate(&grid, &profile)?;
            Ok::<_, IngestError>(GridPreview {
                document_type: profile.document_type.clone(),
                header: grid.header().to_vec(),
                rows: grid.rows().iter().take(limit).cloned().collect(),
                total_rows: grid.len(),
            })
        })
        .await
        .map_err(|e| PipelineError::Worker(e.to_string()))?
        .map_err(PipelineError::from)
    }
}
