// src/config/llm.rs
// Chat completion provider configuration

use serde::{Deserialize, Serialize};

use super::helpers::{env_or, env_parsed};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub base_url: String,
    pub completion_model: String,
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env_or("OPENAI_API_KEY", ""),
            base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            completion_model: env_or("OPENAI_COMPLETION_MODEL", "gpt-3.5-turbo"),
            timeout_secs: env_parsed("OPENAI_TIMEOUT_SECS", 60),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}
