use std::env;

use thiserror::Error;
use url::Url;

use crate::config_env::{optional_trimmed_env, parse_u32_env, parse_u64_env, require_env};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_LANGGRAPH_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_CONVERSATION_LIST_LIMIT: u32 = 20;
const DEFAULT_CHAT_API_BASE_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_CHAT_API_TIMEOUT_MS: u64 = 15_000;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub agent_directory: AgentDirectoryConfig,
    pub conversation_list_limit: u32,
}

#[derive(Debug, Clone)]
pub struct AgentDirectoryConfig {
    pub api_url: Url,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

/// Settings for the client side of the conversation API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout_ms: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingVar(String),
    #[error("invalid integer in env var {0}")]
    ParseInt(String),
    #[error("invalid url in env var {key}: {value}")]
    InvalidUrl { key: String, value: String },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let conversation_list_limit =
            parse_u32_env("CONVERSATION_LIST_LIMIT", DEFAULT_CONVERSATION_LIST_LIMIT)?;
        if conversation_list_limit == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "CONVERSATION_LIST_LIMIT must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            bind_addr: env::var("API_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            agent_directory: AgentDirectoryConfig::from_env()?,
            conversation_list_limit,
        })
    }
}

impl AgentDirectoryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = require_env("LANGGRAPH_API_URL")?;

        Ok(Self {
            api_url: parse_http_url("LANGGRAPH_API_URL", &raw_url)?,
            api_key: optional_trimmed_env("LANGGRAPH_API_KEY"),
            timeout_ms: parse_u64_env("LANGGRAPH_TIMEOUT_MS", DEFAULT_LANGGRAPH_TIMEOUT_MS)?,
        })
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = optional_trimmed_env("CHAT_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_CHAT_API_BASE_URL.to_string());

        Ok(Self {
            base_url: parse_http_url("CHAT_API_BASE_URL", &raw_url)?,
            timeout_ms: parse_u64_env("CHAT_API_TIMEOUT_MS", DEFAULT_CHAT_API_TIMEOUT_MS)?,
        })
    }
}

pub(crate) fn parse_http_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        key: key.to_string(),
        value: raw.to_string(),
    };

    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid());
    }

    Ok(url)
}
