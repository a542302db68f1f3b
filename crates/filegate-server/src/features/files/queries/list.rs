use crate::features::files::{FileGroup, FileRecord, FILE_COLUMNS};
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct ListFilesQuery {
    pub group: FileGroup,
    pub client_id: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListFilesError {
    #[error("Invalid request: missing required parameter client_id")]
    ClientIdRequired,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ListFilesQuery {
    pub fn validate(&self) -> Result<(), ListFilesError> {
        if self.group.requires_client() && self.client_id.is_none() {
            return Err(ListFilesError::ClientIdRequired);
        }
        Ok(())
    }
}

/// Newest first
#[tracing::instrument(skip(pool))]
pub async fn handle(pool: &PgPool, query: ListFilesQuery) -> Result<Vec<FileRecord>, ListFilesError> {
    query.validate()?;

    let sql = format!(
        "SELECT {} FROM {} WHERE ($1::BIGINT IS NULL OR client_id = $1) \
         ORDER BY creation_date DESC, id DESC",
        FILE_COLUMNS,
        query.group.table()
    );

    let records = sqlx::query_as::<_, FileRecord>(&sql)
        .bind(query.client_id)
        .fetch_all(pool)
        .await?;

    Ok(records)
}
