use std::{path::PathBuf, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gmail: GmailConfig,
    pub updating_agent: AgentConfig,
    pub parser_agent: AgentConfig,
    pub understander: UnderstanderConfig,
    pub messaging: MessagingConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct GmailConfig {
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    pub scopes: Vec<String>,
}

/// Settings for one AI-agent role. Endpoint and credentials stay optional
/// until a command actually needs the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub role: &'static str,
    pub endpoint: Option<String>,
    pub api_version: String,
    pub agent_id: Option<String>,
    pub token: Option<String>,
    pub poll_interval: Duration,
    pub run_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct UnderstanderConfig {
    pub endpoint: Option<String>,
    pub key: Option<String>,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct MessagingConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub output_dir: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
