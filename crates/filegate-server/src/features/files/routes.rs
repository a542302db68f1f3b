use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::shared::{parse_client_id, ParamError};
use crate::features::FeatureState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::{
    commands::{self, UploadFileCommand, UploadFileError},
    queries::{self, DownloadFileError, DownloadFileQuery, ListFilesError, ListFilesQuery},
    FileGroup,
};

#[derive(Debug, Default, Deserialize)]
pub struct FileParams {
    pub client_id: Option<String>,
    pub file_group: Option<String>,
}

/// Routes for every file group, each under its own prefix
pub fn files_routes() -> Router<FeatureState> {
    FileGroup::ALL
        .into_iter()
        .fold(Router::new(), |router, group| router.merge(group_routes(group)))
}

fn group_routes(group: FileGroup) -> Router<FeatureState> {
    let prefix = format!("/{}", group.route_prefix());
    Router::new()
        .route(&prefix, get(list_files))
        .route(&format!("{}/", prefix), get(list_files))
        .route(
            &format!("{}/:name", prefix),
            post(upload_file).get(download_file),
        )
        .layer(Extension(group))
}

#[tracing::instrument(skip(state, params, body), fields(group = ?group, size = body.len()))]
async fn upload_file(
    State(state): State<FeatureState>,
    Extension(group): Extension<FileGroup>,
    Path(filename): Path<String>,
    Query(params): Query<FileParams>,
    body: Bytes,
) -> Result<Response, FileApiError> {
    let command = UploadFileCommand {
        group,
        filename,
        client_id: parse_client_id(params.client_id.as_deref())?,
        file_group: params.file_group,
        content: body.to_vec(),
    };

    let record = commands::upload::handle(&state.db, state.storage.as_ref(), command).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(record))).into_response())
}

#[tracing::instrument(skip(state, params), fields(group = ?group))]
async fn list_files(
    State(state): State<FeatureState>,
    Extension(group): Extension<FileGroup>,
    Query(params): Query<FileParams>,
) -> Result<Response, FileApiError> {
    let query = ListFilesQuery {
        group,
        client_id: parse_client_id(params.client_id.as_deref())?,
    };

    let records = queries::list::handle(&state.db, query).await?;
    let meta = json!({ "total": records.len() });

    Ok(ApiResponse::success_with_meta(records, meta).into_response())
}

#[tracing::instrument(skip(state), fields(group = ?group))]
async fn download_file(
    State(state): State<FeatureState>,
    Extension(group): Extension<FileGroup>,
    Path(file_id): Path<String>,
) -> Result<Response, FileApiError> {
    let file_id = file_id
        .trim()
        .parse::<i64>()
        .map_err(|_| FileApiError::Download(DownloadFileError::NotFound))?;

    let response =
        queries::download::handle(&state.db, state.storage.as_ref(), DownloadFileQuery { group, file_id })
            .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&response.record.filename),
            ),
        ],
        response.content,
    )
        .into_response())
}

/// RFC 6266 attachment header; the name is percent-encoded so Cyrillic
/// filenames survive.
pub fn content_disposition(filename: &str) -> String {
    format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(filename)
    )
}

#[derive(Debug)]
enum FileApiError {
    Params(ParamError),
    Upload(UploadFileError),
    List(ListFilesError),
    Download(DownloadFileError),
}

impl From<ParamError> for FileApiError {
    fn from(err: ParamError) -> Self {
        Self::Params(err)
    }
}

impl From<UploadFileError> for FileApiError {
    fn from(err: UploadFileError) -> Self {
        Self::Upload(err)
    }
}

impl From<ListFilesError> for FileApiError {
    fn from(err: ListFilesError) -> Self {
        Self::List(err)
    }
}

impl From<DownloadFileError> for FileApiError {
    fn from(err: DownloadFileError) -> Self {
        Self::Download(err)
    }
}

impl IntoResponse for FileApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            FileApiError::Params(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            FileApiError::Upload(
                e @ (UploadFileError::FilenameRequired
                | UploadFileError::FilenameLength
                | UploadFileError::UnsupportedExtension { .. }
                | UploadFileError::ContentRequired
                | UploadFileError::ClientIdRequired),
            ) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            FileApiError::Upload(e @ UploadFileError::Duplicate(_)) => {
                (StatusCode::CONFLICT, "DUPLICATE", e.to_string())
            },
            FileApiError::List(e @ ListFilesError::ClientIdRequired) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            },
            FileApiError::Download(DownloadFileError::NotFound) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", "File not found".to_string())
            },
            FileApiError::Upload(e) => {
                tracing::error!("File upload failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            },
            FileApiError::List(e) => {
                tracing::error!("File listing failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            },
            FileApiError::Download(e) => {
                tracing::error!("File download failed: {}", e);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_encodes_name() {
        assert_eq!(
            content_disposition("Отчёт (1).xlsx"),
            "attachment; filename*=UTF-8''%D0%9E%D1%82%D1%87%D1%91%D1%82%20%281%29.xlsx"
        );
    }
}
