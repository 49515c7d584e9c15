// src/auth/models.rs

use serde::{Deserialize, Serialize};

use crate::users::RoleName;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtAuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub roles: Vec<RoleName>,
}

/// The authenticated caller, resolved from a bearer token on every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub roles: Vec<RoleName>,
}

impl Principal {
    pub fn has_role(&self, role: RoleName) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[RoleName]) -> bool {
        roles.iter().any(|r| self.has_role(*r))
    }

    /// Admins and directors see and manage everything
    pub fn is_admin_or_director(&self) -> bool {
        self.has_any_role(&[RoleName::Admin, RoleName::Director])
    }
}
