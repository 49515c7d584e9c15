// src/project/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{PdmsError, PdmsResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "ACTIVE",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::Archived => "ARCHIVED",
        }
    }

    pub fn parse(value: &str) -> PdmsResult<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(ProjectStatus::Active),
            "COMPLETED" => Ok(ProjectStatus::Completed),
            "ARCHIVED" => Ok(ProjectStatus::Archived),
            other => Err(PdmsError::invalid(format!(
                "Invalid project status '{}'. Must be ACTIVE, COMPLETED or ARCHIVED",
                other
            ))),
        }
    }
}

/// Role a user holds inside one project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectRole {
    Director,
    ProjectManager,
    TeamMember,
}

impl ProjectRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Director => "DIRECTOR",
            ProjectRole::ProjectManager => "PROJECT_MANAGER",
            ProjectRole::TeamMember => "TEAM_MEMBER",
        }
    }

    pub fn parse(value: &str) -> PdmsResult<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DIRECTOR" => Ok(ProjectRole::Director),
            "PROJECT_MANAGER" => Ok(ProjectRole::ProjectManager),
            "TEAM_MEMBER" => Ok(ProjectRole::TeamMember),
            other => Err(PdmsError::invalid(format!(
                "Invalid member role '{}'. Must be DIRECTOR, PROJECT_MANAGER or TEAM_MEMBER",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List item with the number of documents across all project folders
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub document_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectListParams {
    pub status: Option<String>,
    pub name: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub role: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: i64,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: String,
}

pub fn validate_project_name(name: &str) -> PdmsResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PdmsError::invalid("Project name is required"));
    }
    if trimmed.chars().count() > 255 {
        return Err(PdmsError::invalid("Project name cannot exceed 255 characters"));
    }
    Ok(trimmed.to_string())
}
