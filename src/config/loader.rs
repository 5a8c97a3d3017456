use std::{env, path::PathBuf, time::Duration};

use super::env::{
    AgentConfig, AppConfig, ConfigError, DirectoryConfig, GmailConfig, LoggingConfig,
    MessagingConfig, ServerConfig, UnderstanderConfig,
};

const DEFAULT_GMAIL_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";
const AGENT_API_VERSION: &str = "2025-05-01";
const LEGACY_AGENT_API_VERSION: &str = "2024-12-01-preview";

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let gmail = GmailConfig {
            credentials_path: PathBuf::from(
                env::var("GMAIL_CREDENTIALS_PATH").unwrap_or_else(|_| "credentials.json".into()),
            ),
            token_path: PathBuf::from(
                env::var("GMAIL_TOKEN_PATH").unwrap_or_else(|_| "token.json".into()),
            ),
            scopes: env::var("GMAIL_SCOPES")
                .map(|value| split_list(&value, ','))
                .ok()
                .filter(|scopes| !scopes.is_empty())
                .unwrap_or_else(|| vec![DEFAULT_GMAIL_SCOPE.to_string()]),
        };

        let updating_agent = agent_from_env(
            "updating",
            "UPDATING_AGENT_ENDPOINT",
            "UPDATING_CONNECTION_STRING",
            "UPDATING_AGENT_ID",
            "UPDATING_AGENT_TOKEN",
        )?;
        let parser_agent = agent_from_env(
            "parser",
            "PARSER_AGENT_ENDPOINT",
            "PARSER_CONNECTION_STRING",
            "PARSER_AGENT_ID",
            "PARSER_AGENT_TOKEN",
        )?;

        let understander = UnderstanderConfig {
            endpoint: non_empty("UNDERSTANDER_ENDPOINT"),
            key: non_empty("UNDERSTANDER_KEY"),
            poll_interval: Duration::from_millis(parse_or("UNDERSTANDER_POLL_INTERVAL_MS", 1_000)),
        };

        let messaging = MessagingConfig {
            account_sid: non_empty("TWILIO_ACCOUNT_SID"),
            auth_token: non_empty("TWILIO_AUTH_TOKEN"),
            from_number: non_empty("WHATSAPP_FROM"),
            to_number: non_empty("WHATSAPP_TO"),
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            output_dir: env::var("OUTPUT_DIR").unwrap_or_else(|_| "output".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let server = ServerConfig {
            addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string()),
        };

        Ok(Self {
            gmail,
            updating_agent,
            parser_agent,
            understander,
            messaging,
            directories,
            logging,
            server,
        })
    }
}

fn agent_from_env(
    role: &'static str,
    endpoint_key: &'static str,
    connection_key: &'static str,
    id_key: &'static str,
    token_key: &'static str,
) -> Result<AgentConfig, ConfigError> {
    let (endpoint, legacy) = match non_empty(endpoint_key) {
        Some(endpoint) => (Some(endpoint.trim_end_matches('/').to_string()), false),
        None => match non_empty(connection_key) {
            Some(conn) => {
                let endpoint = endpoint_from_connection_string(&conn).map_err(|reason| {
                    ConfigError::Invalid {
                        key: connection_key,
                        reason,
                    }
                })?;
                (Some(endpoint), true)
            }
            None => (None, false),
        },
    };

    let api_version = non_empty("AGENT_API_VERSION").unwrap_or_else(|| {
        if legacy {
            LEGACY_AGENT_API_VERSION.to_string()
        } else {
            AGENT_API_VERSION.to_string()
        }
    });

    Ok(AgentConfig {
        role,
        endpoint,
        api_version,
        agent_id: non_empty(id_key),
        token: non_empty(token_key),
        poll_interval: Duration::from_millis(parse_or("AGENT_POLL_INTERVAL_MS", 1_000)),
        run_timeout: Duration::from_secs(parse_or("AGENT_RUN_TIMEOUT_SECS", 300)),
    })
}

/// Turns a `host;subscription;resource_group;project` connection string into
/// the agents base URL of that project.
pub fn endpoint_from_connection_string(conn: &str) -> Result<String, String> {
    let parts: Vec<&str> = conn.split(';').map(str::trim).collect();
    let [host, subscription, resource_group, project] = parts.as_slice() else {
        return Err(format!(
            "expected 4 ';'-separated parts (host;subscription;resource_group;project), got {}",
            parts.len()
        ));
    };
    if [host, subscription, resource_group, project]
        .iter()
        .any(|part| part.is_empty())
    {
        return Err("connection string contains an empty part".to_string());
    }
    let host = host
        .trim_start_matches("https://")
        .trim_end_matches('/');
    Ok(format!(
        "https://{host}/agents/v1.0/subscriptions/{subscription}/resourceGroups/{resource_group}/providers/Microsoft.MachineLearningServices/workspaces/{project}"
    ))
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn split_list(value: &str, sep: char) -> Vec<String> {
    value
        .split(sep)
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}
