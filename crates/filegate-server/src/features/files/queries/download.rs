use crate::features::files::{FileGroup, FileRecord, FILE_COLUMNS};
use crate::storage::BlobStore;
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct DownloadFileQuery {
    pub group: FileGroup,
    pub file_id: i64,
}

#[derive(Debug)]
pub struct DownloadFileResponse {
    pub record: FileRecord,
    pub content: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadFileError {
    #[error("File not found")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

#[tracing::instrument(skip(pool, storage))]
pub async fn handle(
    pool: &PgPool,
    storage: &dyn BlobStore,
    query: DownloadFileQuery,
) -> Result<DownloadFileResponse, DownloadFileError> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = $1",
        FILE_COLUMNS,
        query.group.table()
    );

    let record = sqlx::query_as::<_, FileRecord>(&sql)
        .bind(query.file_id)
        .fetch_optional(pool)
        .await?
        .ok_or(DownloadFileError::NotFound)?;

    let content = storage.download(&record.storage_key).await?;

    tracing::debug!(id = record.id, size = content.len(), "File loaded from storage");

    Ok(DownloadFileResponse { record, content })
}
