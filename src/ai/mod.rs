//! Remote AI-agent conversations.
//!
//! Everything that talks to the agent service goes through [`AgentConversation`];
//! the résumé workflows only ever see reply text.

mod client;
pub mod inference;
pub mod prompts;

use async_trait::async_trait;
use thiserror::Error;

pub use client::AgentClient;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("agent API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("agent run {run_id} ended with status {status}: {message}")]
    RunFailed {
        run_id: String,
        status: String,
        message: String,
    },

    #[error("agent run {run_id} did not finish within {secs}s")]
    RunTimedOut { run_id: String, secs: u64 },

    #[error("agent thread contained no assistant reply")]
    NoAssistantReply,

    #[error("unexpected agent reply: {0}")]
    UnexpectedReply(String),

    #[error("agent did not return a valid résumé JSON object: {0}")]
    InvalidResume(String),
}

/// One request/response exchange with a remote agent. Each call opens a fresh
/// thread; nothing is reused between calls.
#[async_trait]
pub trait AgentConversation: Send + Sync {
    async fn send(&self, text: &str) -> Result<String, AgentError>;
}
