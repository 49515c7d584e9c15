// src/config/mod.rs
// Central configuration for the PDMS service

pub mod auth;
pub mod helpers;
pub mod llm;
pub mod server;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

lazy_static! {
    pub static ref CONFIG: PdmsConfig = PdmsConfig::from_env();
}

/// Main configuration structure - composes all domain configs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdmsConfig {
    pub server: server::ServerConfig,
    pub database: server::DatabaseConfig,
    pub logging: server::LoggingConfig,
    pub storage: server::StorageConfig,
    pub auth: auth::AuthConfig,
    pub openai: llm::OpenAIConfig,
}

impl PdmsConfig {
    pub fn from_env() -> Self {
        // Don't fail if .env doesn't exist (production uses real env)
        dotenvy::dotenv().ok();

        Self {
            server: server::ServerConfig::from_env(),
            database: server::DatabaseConfig::from_env(),
            logging: server::LoggingConfig::from_env(),
            storage: server::StorageConfig::from_env(),
            auth: auth::AuthConfig::from_env(),
            openai: llm::OpenAIConfig::from_env(),
        }
    }

    /// Self-contained config for tests: in-memory database, given storage root,
    /// fixed signing secret and no chat provider.
    pub fn for_tests(storage_dir: &str) -> Self {
        Self {
            server: server::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: server::DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            logging: server::LoggingConfig {
                level: "debug".to_string(),
            },
            storage: server::StorageConfig {
                root_dir: storage_dir.to_string(),
                max_upload_bytes: 1024 * 1024,
            },
            auth: auth::AuthConfig {
                jwt_secret: "pdms-test-secret".to_string(),
                access_token_ttl_ms: 3_600_000,
                refresh_token_ttl_ms: 7_200_000,
                bcrypt_cost: 4,
                bootstrap_admin: None,
            },
            openai: llm::OpenAIConfig {
                api_key: String::new(),
                base_url: "http://127.0.0.1:9".to_string(),
                completion_model: "test-model".to_string(),
                timeout_secs: 1,
            },
        }
    }

    /// Validate config on startup
    pub fn validate(&self) -> anyhow::Result<()> {
        self.auth.validate()?;
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("PDMS_SQLITE_MAX_CONNECTIONS must be at least 1"));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        self.server.bind_address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let mut config = PdmsConfig::for_tests("/tmp/pdms");
        assert!(config.validate().is_ok());

        config.auth.jwt_secret = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = PdmsConfig::for_tests("/tmp/pdms");
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }
}
