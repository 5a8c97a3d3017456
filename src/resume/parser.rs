use std::sync::Arc;

use serde_json::{json, Value};

use crate::ai::{inference::parse_json_object, prompts, AgentConversation, AgentError};

/// Turns free text (usually OCR output) into a résumé JSON object using the
/// parsing agent.
pub struct ResumeParser {
    agent: Arc<dyn AgentConversation>,
}

impl ResumeParser {
    pub fn new(agent: Arc<dyn AgentConversation>) -> Self {
        Self { agent }
    }

    pub async fn parse(&self, resume_text: &str) -> Result<Value, AgentError> {
        let payload = json!({ "resume": resume_text });
        let body = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());
        let reply = self
            .agent
            .send(&format!("{}{}", prompts::PARSE_RESUME, body))
            .await?;

        parse_json_object(&reply).map(Value::Object).map_err(|err| {
            tracing::warn!(target: "agent", error = %err, raw = %reply, "failed to decode parsed resume");
            AgentError::InvalidResume(err.to_string())
        })
    }
}
