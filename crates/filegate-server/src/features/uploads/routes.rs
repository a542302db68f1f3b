use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::files::{commands, FileGroup, FileRecord, UploadFileCommand, UploadFileError};
use crate::features::shared::{parse_client_id, parse_limit, ParamError};
use crate::features::FeatureState;
use crate::ingest::pipeline::DEFAULT_PREVIEW_ROWS;
use crate::ingest::{IngestReceipt, PipelineError, SinkError};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use filegate_ingest::{parser::FileFormat, IngestError};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;

pub fn uploads_routes() -> Router<FeatureState> {
    Router::new()
        .route("/uploads/:document_type/:name", post(upload_document))
        .route("/uploads/:document_type/:name/preview", post(preview_document))
        .route("/profiles", get(list_profiles))
}

#[derive(Debug, Serialize)]
pub struct UploadDocumentResponse {
    pub file: FileRecord,
    pub receipt: IngestReceipt,
}

#[tracing::instrument(skip(state, params, body), fields(size = body.len()))]
async fn upload_document(
    State(state): State<FeatureState>,
    Path((document_type, filename)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Response, UploadApiError> {
    let client_id = parse_client_id(params.get("client_id").map(String::as_str))?
        .ok_or(ParamError::Missing("client_id"))?;

    let plan = state.ingest.plan(&document_type, &params)?;
    FileFormat::from_filename(&filename).map_err(PipelineError::from)?;

    let content = body.to_vec();
    let file = commands::upload::handle(
        &state.db,
        state.storage.as_ref(),
        UploadFileCommand {
            group: FileGroup::ClientFiles,
            filename,
            client_id: Some(client_id),
            file_group: params.get("file_group").cloned(),
            content: content.clone(),
        },
    )
    .await?;

    let receipt = state.ingest.run(plan, &file.filename, content).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UploadDocumentResponse { file, receipt })),
    )
        .into_response())
}

#[tracing::instrument(skip(state, params, body), fields(size = body.len()))]
async fn preview_document(
    State(state): State<FeatureState>,
    Path((document_type, filename)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Response, UploadApiError> {
    let limit = parse_limit(params.get("limit").map(String::as_str), DEFAULT_PREVIEW_ROWS)?;

    let preview = state
        .ingest
        .preview(&document_type, &filename, body.to_vec(), limit)
        .await?;

    Ok(ApiResponse::success(preview).into_response())
}

async fn list_profiles(State(state): State<FeatureState>) -> Response {
    let profiles = state.ingest.registry().profiles();
    let meta = json!({ "total": profiles.len() });
    ApiResponse::success_with_meta(profiles, meta).into_response()
}

#[derive(Debug)]
enum UploadApiError {
    Params(ParamError),
    Pipeline(PipelineError),
    Store(UploadFileError),
}

impl From<ParamError> for UploadApiError {
    fn from(err: ParamError) -> Self {
        Self::Params(err)
    }
}

impl From<PipelineError> for UploadApiError {
    fn from(err: PipelineError) -> Self {
        Self::Pipeline(err)
    }
}

impl From<UploadFileError> for UploadApiError {
    fn from(err: UploadFileError) -> Self {
        Self::Store(err)
    }
}

impl IntoResponse for UploadApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            UploadApiError::Params(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            UploadApiError::Pipeline(PipelineError::Ingest(e)) => {
                let status = match e {
                    IngestError::UnknownDocumentType(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::BAD_REQUEST,
                };
                tracing::warn!(code = e.code(), "Upload rejected: {}", e);
                (status, e.code(), e.to_string())
            },
            UploadApiError::Pipeline(PipelineError::Sink(e @ SinkError::Remote { .. })) => {
                tracing::error!("Remote delivery failed: {}", e);
                (StatusCode::BAD_GATEWAY, "REMOTE_SINK_ERROR", e.to_string())
            },
            UploadApiError::Pipeline(e) => {
                tracing::error!("Upload processing failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            },
            UploadApiError::Store(
                e @ (UploadFileError::FilenameRequired
                | UploadFileError::FilenameLength
                | UploadFileError::UnsupportedExtension { .. }
                | UploadFileError::ContentRequired
                | UploadFileError::ClientIdRequired),
            ) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            UploadApiError::Store(e) => {
                tracing::error!("Storing upload failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            },
        };

        ErrorResponse::new(code, message).into_response_with(status)
    }
}
