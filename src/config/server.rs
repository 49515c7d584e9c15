// src/config/server.rs
// Server, database, logging and storage configuration

use serde::{Deserialize, Serialize};

use super::helpers::{env_list, env_or, env_parsed};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_or("PDMS_HOST", "0.0.0.0"),
            port: env_parsed("PDMS_PORT", 8080),
            cors_origins: env_list("PDMS_CORS_ORIGINS", "*"),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            url: env_or("DATABASE_URL", "sqlite://pdms.db"),
            max_connections: env_parsed("PDMS_SQLITE_MAX_CONNECTIONS", 5),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            level: env_or("PDMS_LOG_LEVEL", "info"),
        }
    }

    pub fn tracing_level(&self) -> tracing::Level {
        self.level.parse().unwrap_or(tracing::Level::INFO)
    }
}

/// File storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub root_dir: String,
    pub max_upload_bytes: usize,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            root_dir: env_or("PDMS_STORAGE_DIR", "./uploads"),
            max_upload_bytes: env_parsed("PDMS_MAX_UPLOAD_BYTES", 50 * 1024 * 1024),
        }
    }
}
