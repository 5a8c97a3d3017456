//! In-memory stand-ins for the remote services, shared by the unit tests.

use std::collections::VecDeque;

use anyhow::{bail, Result};
use async_trait::async_trait;
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::{
    ai::{AgentConversation, AgentError},
    document::{AnalyzeResult, DocumentAnalyzer, DocumentSource, Paragraph},
    domain::{Email, MailAction},
    infrastructure::notifier::Messenger,
    mail::MailProvider,
};

/// Replies with canned text, one per call, and records what it was sent.
#[derive(Default)]
pub struct ScriptedAgent {
    replies: Mutex<VecDeque<String>>,
    pub sent: Mutex<Vec<String>>,
}

impl ScriptedAgent {
    pub fn replying(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn last_sent(&self) -> Option<String> {
        self.sent.lock().last().cloned()
    }
}

#[async_trait]
impl AgentConversation for ScriptedAgent {
    async fn send(&self, text: &str) -> Result<String, AgentError> {
        self.sent.lock().push(text.to_string());
        self.replies
            .lock()
            .pop_front()
            .ok_or(AgentError::NoAssistantReply)
    }
}

#[derive(Default)]
pub struct FakeMailbox {
    pub latest: Option<Email>,
    pub actions: Mutex<Vec<(String, MailAction)>>,
}

impl FakeMailbox {
    pub fn with(email: Email) -> Self {
        Self {
            latest: Some(email),
            actions: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MailProvider for FakeMailbox {
    async fn latest(&self) -> Result<Option<Email>> {
        Ok(self.latest.clone())
    }

    async fn apply(&self, id: &str, action: MailAction) -> Result<Value> {
        self.actions.lock().push((id.to_string(), action));
        Ok(json!({ "id": id }))
    }
}

#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<String>>,
    pub fail: bool,
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, body: &str) -> Result<String> {
        if self.fail {
            bail!("messaging provider unavailable");
        }
        let mut sent = self.sent.lock();
        sent.push(body.to_string());
        Ok(format!("SM{}", sent.len()))
    }
}

pub struct StaticAnalyzer {
    pub paragraphs: Vec<&'static str>,
    pub seen: Mutex<Vec<DocumentSource>>,
}

impl StaticAnalyzer {
    pub fn new(paragraphs: Vec<&'static str>) -> Self {
        Self {
            paragraphs,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for StaticAnalyzer {
    async fn analyze(&self, source: DocumentSource) -> Result<AnalyzeResult> {
        self.seen.lock().push(source);
        Ok(AnalyzeResult {
            paragraphs: self
                .paragraphs
                .iter()
                .map(|content| Paragraph {
                    content: content.to_string(),
                })
                .collect(),
            ..Default::default()
        })
    }
}

/// Serves `router` on an ephemeral loopback port and returns its base URL.
pub async fn serve_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// HTTP client for talking to stubs; ignores any proxy set in the environment.
pub fn stub_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

pub fn sample_email(body: &str) -> Email {
    Email {
        sender: "Hiring Team <talent@corp.example>".into(),
        id: "msg-42".into(),
        subject: "Your application".into(),
        body: body.to_string(),
        received_at: None,
    }
}

pub fn sample_resume() -> Value {
    serde_json::from_str(include_str!("fixtures/resume.json")).expect("fixture parses")
}
