// src/document/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::users::UserSummary;

pub const DEFAULT_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: i64,
    pub folder_id: i64,
    pub name: String,
    pub mime_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub display_order: i64,
    pub version_count: i64,
    pub latest_version_number: Option<i64>,
    pub creator_id: Option<i64>,
    pub creator_name: Option<String>,
    pub creator_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: i64,
    pub folder_id: i64,
    pub name: String,
    pub mime_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserSummary>,
    pub display_order: i64,
    pub version_count: i64,
    pub latest_version_number: Option<i64>,
}

impl From<DocumentRow> for DocumentResponse {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            folder_id: row.folder_id,
            name: row.name,
            mime_type: row.mime_type,
            size: row.size,
            created_at: row.created_at,
            created_by: UserSummary::from_parts(row.creator_id, row.creator_name, row.creator_email),
            display_order: row.display_order,
            version_count: row.version_count,
            latest_version_number: row.latest_version_number,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct VersionRow {
    pub id: i64,
    pub document_id: i64,
    pub version_number: i64,
    pub storage_path: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub embedding_status: Option<String>,
    pub creator_id: Option<i64>,
    pub creator_name: Option<String>,
    pub creator_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub version_number: i64,
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserSummary>,
    pub embedding_status: Option<String>,
}

impl From<VersionRow> for VersionResponse {
    fn from(row: VersionRow) -> Self {
        Self {
            version_number: row.version_number,
            size: row.size,
            created_at: row.created_at,
            created_by: UserSummary::from_parts(row.creator_id, row.creator_name, row.creator_email),
            embedding_status: row.embedding_status,
        }
    }
}

/// A file received from a multipart upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub name: String,
    pub project_id: Option<i64>,
    pub folder_id: Option<i64>,
    pub file: Option<UploadedFile>,
}

/// Newest stored version, opened for streaming to the client
#[derive(Debug)]
pub struct DownloadedFile {
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
    pub file: tokio::fs::File,
}

/// MIME type from the file name, then the declared part type, then octet-stream
pub fn detect_mime(filename: &str, declared: Option<&str>) -> String {
    if let Some(guess) = mime_guess::from_path(filename).first() {
        return guess.essence_str().to_string();
    }
    declared
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_MIME)
        .to_string()
}

/// Original (sanitised) file name from `.../{doc}_v{n}_{file}`
pub fn stored_filename(storage_path: &str) -> String {
    let file = storage_path.rsplit('/').next().unwrap_or(storage_path);
    file.splitn(3, '_').nth(2).unwrap_or(file).to_string()
}
