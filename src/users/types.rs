// src/users/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Global role names assigned to user accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleName {
    Admin,
    Director,
    ProjectManager,
    TeamMember,
}

impl RoleName {
    pub const ALL: [RoleName; 4] = [
        RoleName::Admin,
        RoleName::Director,
        RoleName::ProjectManager,
        RoleName::TeamMember,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Admin => "ADMIN",
            RoleName::Director => "DIRECTOR",
            RoleName::ProjectManager => "PROJECT_MANAGER",
            RoleName::TeamMember => "TEAM_MEMBER",
        }
    }

    /// Accepts both `DIRECTOR` and the authority form `ROLE_DIRECTOR`
    pub fn parse(value: &str) -> Option<Self> {
        let name = value.trim();
        let name = name.strip_prefix("ROLE_").unwrap_or(name);
        RoleName::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

/// Full `users` row, including the password hash. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn from_row(row: UserRow, roles: Vec<Role>) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            roles,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Compact user reference embedded in folder and document responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl UserSummary {
    /// Builds a summary from LEFT JOINed creator columns, which are all NULL
    /// once the creator account is deleted.
    pub fn from_parts(id: Option<i64>, name: Option<String>, email: Option<String>) -> Option<Self> {
        match (id, name, email) {
            (Some(id), Some(name), Some(email)) => Some(Self { id, name, email }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub role_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn password_change_requested(&self) -> bool {
        self.password
            .as_deref()
            .map(|p| !p.trim().is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserSearchParams {
    pub query: String,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailCheckParams {
    pub email: String,
}
