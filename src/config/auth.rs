// src/config/auth.rs
// Token signing and bootstrap account configuration

use serde::{Deserialize, Serialize};

use super::helpers::{env_opt, env_or, env_parsed};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub access_token_ttl_ms: i64,
    pub refresh_token_ttl_ms: i64,
    pub bcrypt_cost: u32,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Account created on first start when no user with this email exists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let bootstrap_admin = match (env_opt("PDMS_ADMIN_EMAIL"), env_opt("PDMS_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                email,
                password,
                name: env_or("PDMS_ADMIN_NAME", "Administrator"),
            }),
            _ => None,
        };

        Self {
            jwt_secret: env_or("JWT_SECRET", ""),
            access_token_ttl_ms: env_parsed("JWT_EXPIRATION_MS", 86_400_000),
            refresh_token_ttl_ms: env_parsed("JWT_REFRESH_EXPIRATION_MS", 604_800_000),
            bcrypt_cost: env_parsed("PDMS_BCRYPT_COST", bcrypt::DEFAULT_COST),
            bootstrap_admin,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow::anyhow!("JWT_SECRET must be set"));
        }
        if self.access_token_ttl_ms <= 0 || self.refresh_token_ttl_ms <= 0 {
            return Err(anyhow::anyhow!("Token lifetimes must be positive"));
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(anyhow::anyhow!("PDMS_BCRYPT_COST must be between 4 and 31"));
        }
        Ok(())
    }
}
