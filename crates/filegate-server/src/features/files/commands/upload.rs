use crate::features::files::{FileGroup, FileRecord, DEFAULT_FILE_GROUP, FILE_COLUMNS};
use crate::features::shared::is_unique_violation;
use crate::storage::BlobStore;
use filegate_common::filename::{self, ALLOWED_EXTENSIONS};
use filegate_common::sha256_hex;
use sqlx::PgPool;

/// How many `name (n).ext` variants are tried before giving up
const MAX_RENAME_ATTEMPTS: u32 = 1000;

#[derive(Debug, Clone)]
pub struct UploadFileCommand {
    pub group: FileGroup,
    pub filename: String,
    pub client_id: Option<i64>,
    pub file_group: Option<String>,
    pub content: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadFileError {
    #[error("Filename is required and cannot be empty")]
    FilenameRequired,
    #[error("Filename must not exceed 255 characters")]
    FilenameLength,
    #[error("Unsupported file extension in '{filename}', expected one of: {allowed}")]
    UnsupportedExtension { filename: String, allowed: String },
    #[error("File content is required and cannot be empty")]
    ContentRequired,
    #[error("Invalid request: missing required parameter client_id")]
    ClientIdRequired,
    #[error("File '{0}' already exists")]
    Duplicate(String),
    #[error("No free name left for '{0}'")]
    NamesExhausted(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl UploadFileCommand {
    pub fn validate(&self) -> Result<(), UploadFileError> {
        let name = filename::sanitize(&self.filename);
        if name.is_empty() {
            return Err(UploadFileError::FilenameRequired);
        }
        if name.len() > 255 {
            return Err(UploadFileError::FilenameLength);
        }
        if !filename::is_allowed(&name) {
            return Err(UploadFileError::UnsupportedExtension {
                filename: name,
                allowed: ALLOWED_EXTENSIONS.join(", "),
            });
        }
        if self.content.is_empty() {
            return Err(UploadFileError::ContentRequired);
        }
        if self.group.requires_client() && self.client_id.is_none() {
            return Err(UploadFileError::ClientIdRequired);
        }
        Ok(())
    }
}

/// Register the file's metadata, then store its bytes.
///
/// The metadata row is inserted first so that the unique `storage_key`
/// claims the name; concurrent uploads of the same name end up with
/// distinct `name (n).ext` keys.
#[tracing::instrument(skip(pool, storage, command), fields(group = ?command.group, filename = %command.filename, size = command.content.len()))]
pub async fn handle(
    pool: &PgPool,
    storage: &dyn BlobStore,
    command: UploadFileCommand,
) -> Result<FileRecord, UploadFileError> {
    command.validate()?;

    let group = command.group;
    let client_id = if group.requires_client() {
        command.client_id
    } else {
        None
    };
    let base_name = filename::sanitize(&command.filename);
    let file_group = command
        .file_group
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| DEFAULT_FILE_GROUP.to_string());
    let checksum = sha256_hex(&command.content);
    let size = command.content.len() as i64;

    let insert = format!(
        "INSERT INTO {} (filename, client_id, file_group, storage_key, size_bytes, checksum) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
        group.table(),
        FILE_COLUMNS
    );

    for attempt in 0..MAX_RENAME_ATTEMPTS {
        let name = if attempt == 0 {
            base_name.clone()
        } else {
            filename::numbered(&base_name, attempt)
        };
        let key = group.storage_key(client_id, &name);

        let inserted = sqlx::query_as::<_, FileRecord>(&insert)
            .bind(&name)
            .bind(client_id)
            .bind(&file_group)
            .bind(&key)
            .bind(size)
            .bind(&checksum)
            .fetch_one(pool)
            .await;

        let record = match inserted {
            Ok(record) => record,
            Err(e) if is_unique_violation(&e) => {
                if !group.renames_duplicates() {
                    return Err(UploadFileError::Duplicate(name));
                }
                continue;
            },
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = storage.upload(&key, command.content, None).await {
            let cleanup = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", group.table()))
                .bind(record.id)
                .execute(pool)
                .await;
            if let Err(cleanup) = cleanup {
                tracing::error!(error = %cleanup, id = record.id, "Failed to remove orphaned file record");
            }
            return Err(e.into());
        }

        tracing::info!(id = record.id, key = %record.storage_key, "File stored");
        return Ok(record);
    }

    Err(UploadFileError::NamesExhausted(base_name))
}
