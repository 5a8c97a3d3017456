use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tokio::time::{sleep, Instant};

use crate::config::AgentConfig;

use super::{
    inference::{
        api_error_message, assistant_reply, CreateMessageRequest, CreateRunRequest, MessageList,
        RunObject, RunStatus, ThreadObject,
    },
    AgentConversation, AgentError,
};

/// Client for one agent of the Azure AI Agents threads/runs API.
#[derive(Clone)]
pub struct AgentClient {
    http: Client,
    endpoint: String,
    api_version: String,
    agent_id: String,
    token: String,
    poll_interval: Duration,
    run_timeout: Duration,
}

impl AgentClient {
    pub fn new(http: Client, config: &AgentConfig) -> Result<Self> {
        let role = config.role;
        let endpoint = config.endpoint.clone().with_context(|| {
            format!("{role} agent endpoint (or connection string) must be configured")
        })?;
        let agent_id = config
            .agent_id
            .clone()
            .with_context(|| format!("{role} agent id must be configured"))?;
        let token = config
            .token
            .clone()
            .with_context(|| format!("{role} agent token must be configured"))?;

        Ok(Self {
            http,
            endpoint,
            api_version: config.api_version.clone(),
            agent_id,
            token,
            poll_interval: config.poll_interval,
            run_timeout: config.run_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}?api-version={}", self.endpoint, path, self.api_version)
    }

    async fn create_thread(&self) -> Result<String, AgentError> {
        let response = self
            .http
            .post(self.url("threads"))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let thread: ThreadObject = read_json(response).await?;
        Ok(thread.id)
    }

    async fn post_user_message(&self, thread_id: &str, text: &str) -> Result<(), AgentError> {
        let response = self
            .http
            .post(self.url(&format!("threads/{thread_id}/messages")))
            .bearer_auth(&self.token)
            .json(&CreateMessageRequest {
                role: "user",
                content: text,
            })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Starts a run and polls it until it reaches a terminal status.
    async fn run_to_completion(&self, thread_id: &str) -> Result<(), AgentError> {
        let response = self
            .http
            .post(self.url(&format!("threads/{thread_id}/runs")))
            .bearer_auth(&self.token)
            .json(&CreateRunRequest {
                assistant_id: &self.agent_id,
            })
            .send()
            .await?;
        let mut run: RunObject = read_json(response).await?;
        let started = Instant::now();

        while !run.status.is_terminal() {
            if started.elapsed() > self.run_timeout {
                return Err(AgentError::RunTimedOut {
                    run_id: run.id,
                    secs: self.run_timeout.as_secs(),
                });
            }
            sleep(self.poll_interval).await;
            let response = self
                .http
                .get(self.url(&format!("threads/{thread_id}/runs/{}", run.id)))
                .bearer_auth(&self.token)
                .send()
                .await?;
            run = read_json(response).await?;
            tracing::debug!(target: "agent", run_id = %run.id, status = run.status.as_str(), "run polled");
        }

        if run.status != RunStatus::Completed {
            let message = run
                .last_error
                .and_then(|e| e.message.or(e.code))
                .unwrap_or_else(|| "no error detail".to_string());
            return Err(AgentError::RunFailed {
                run_id: run.id,
                status: run.status.as_str().to_string(),
                message,
            });
        }
        Ok(())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<MessageList, AgentError> {
        let response = self
            .http
            .get(self.url(&format!("threads/{thread_id}/messages")))
            .bearer_auth(&self.token)
            .query(&[("order", "desc")])
            .send()
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl AgentConversation for AgentClient {
    async fn send(&self, text: &str) -> Result<String, AgentError> {
        let thread_id = self.create_thread().await?;
        tracing::info!(target: "agent", thread_id = %thread_id, agent_id = %self.agent_id, "sending message to agent");

        self.post_user_message(&thread_id, text).await?;
        self.run_to_completion(&thread_id).await?;
        tracing::info!(target: "agent", thread_id = %thread_id, "run completed, retrieving messages");

        let messages = self.list_messages(&thread_id).await?;
        if messages.data.is_empty() {
            tracing::warn!(target: "agent", thread_id = %thread_id, "no messages found in the thread after run completion");
        }
        assistant_reply(&messages)
            .map(str::to_string)
            .ok_or(AgentError::NoAssistantReply)
    }
}

async fn check_status(response: Response) -> Result<Response, AgentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AgentError::Api {
        status: status.as_u16(),
        message: api_error_message(body),
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, AgentError> {
    let response = check_status(response).await?;
    Ok(response.json().await?)
}
