//! File registry: stored uploads, reports and templates
//!
//! Each [`FileGroup`] has its own metadata table and route prefix; the bytes
//! live in the blob store under `{prefix}/{client_id or "shared"}/{filename}`.

pub mod commands;
pub mod queries;
pub mod routes;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use commands::{UploadFileCommand, UploadFileError};
pub use queries::{DownloadFileError, DownloadFileQuery, DownloadFileResponse, ListFilesError, ListFilesQuery};
pub use routes::files_routes;

/// Default `file_group` label for uploads that do not name one
pub const DEFAULT_FILE_GROUP: &str = "Прочее";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileGroup {
    Files,
    Templates,
    ClientFiles,
}

impl FileGroup {
    pub const ALL: [FileGroup; 3] = [FileGroup::Files, FileGroup::Templates, FileGroup::ClientFiles];

    pub fn table(self) -> &'static str {
        match self {
            FileGroup::Files => "files",
            FileGroup::Templates => "templates",
            FileGroup::ClientFiles => "client_files",
        }
    }

    pub fn route_prefix(self) -> &'static str {
        match self {
            FileGroup::Files => "files",
            FileGroup::Templates => "templates",
            FileGroup::ClientFiles => "client-files",
        }
    }

    /// Templates are shared; every other group is scoped to a client
    pub fn requires_client(self) -> bool {
        !matches!(self, FileGroup::Templates)
    }

    /// Templates reject a second upload with the same name; other groups
    /// store it as `name (n).ext`
    pub fn renames_duplicates(self) -> bool {
        !matches!(self, FileGroup::Templates)
    }

    pub fn storage_key(self, client_id: Option<i64>, filename: &str) -> String {
        let scope = client_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "shared".to_string());
        format!("{}/{}/{}", self.route_prefix(), scope, filename)
    }
}

/// Metadata row of a stored file
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FileRecord {
    pub id: i64,
    pub filename: String,
    pub client_id: Option<i64>,
    pub file_group: String,
    #[serde(skip)]
    pub storage_key: String,
    pub size_bytes: i64,
    pub checksum: String,
    pub creation_date: DateTime<Utc>,
}

pub(crate) const FILE_COLUMNS: &str =
    "id, filename, client_id, file_group, storage_key, size_bytes, checksum, creation_date";
