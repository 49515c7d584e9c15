// src/folder/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{PdmsError, PdmsResult};
use crate::users::UserSummary;

pub const MAX_FOLDER_NAME_LEN: usize = 255;

/// `folders` row joined with its creator and whether it has children
#[derive(Debug, Clone, FromRow)]
pub struct FolderRow {
    pub id: i64,
    pub project_id: i64,
    pub parent_folder_id: Option<i64>,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub display_order: i64,
    pub has_subfolders: bool,
    pub creator_id: Option<i64>,
    pub creator_name: Option<String>,
    pub creator_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderResponse {
    pub id: i64,
    pub project_id: i64,
    pub parent_folder_id: Option<i64>,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserSummary>,
    pub display_order: i64,
    pub has_subfolders: bool,
}

impl From<FolderRow> for FolderResponse {
    fn from(row: FolderRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            parent_folder_id: row.parent_folder_id,
            name: row.name,
            created_at: row.created_at,
            created_by: UserSummary::from_parts(row.creator_id, row.creator_name, row.creator_email),
            display_order: row.display_order,
            has_subfolders: row.has_subfolders,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub name: String,
    pub project_id: i64,
    #[serde(default)]
    pub parent_folder_id: Option<i64>,
}

/// Trimmed folder name, or a validation error
pub fn validate_folder_name(name: &str) -> PdmsResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PdmsError::invalid("Folder name is required"));
    }
    if trimmed.chars().count() > MAX_FOLDER_NAME_LEN {
        return Err(PdmsError::invalid("Folder name cannot exceed 255 characters"));
    }
    if trimmed.contains(['/', '\\']) {
        return Err(PdmsError::invalid("Folder name cannot contain path separators"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_name_validation() {
        assert_eq!(validate_folder_name("  Drawings ").unwrap(), "Drawings");
        assert!(validate_folder_name("   ").is_err());
        assert!(validate_folder_name("a/b").is_err());
        assert!(validate_folder_name("a\\b").is_err());
        assert!(validate_folder_name(&"x".repeat(256)).is_err());
        assert!(validate_folder_name(&"x".repeat(255)).is_ok());
    }
}
