use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use crate::{
    config::GmailConfig,
    domain::{Email, MailAction},
};

use super::{auth::GmailAuthenticator, MailProvider};

const GMAIL_API_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

#[derive(Clone)]
pub struct GmailClient {
    http: Client,
    access_token: String,
    base_url: String,
}

impl GmailClient {
    /// Authenticates (cache, refresh or interactive consent) and returns a ready client.
    pub async fn connect(http: Client, config: &GmailConfig) -> Result<Self> {
        let access_token = GmailAuthenticator::new(http.clone(), config.clone())
            .access_token()
            .await
            .context("mail authentication failed")?;
        Ok(Self {
            http,
            access_token,
            base_url: GMAIL_API_URL.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self
            .http
            .get(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("mail API request {path} failed"))?;
        Ok(response.json().await?)
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("mail API request {path} failed"))?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl MailProvider for GmailClient {
    async fn latest(&self) -> Result<Option<Email>> {
        let list: MessageList = self.get_json("messages", &[("maxResults", "1")]).await?;
        let Some(first) = list.messages.into_iter().next() else {
            tracing::info!(target: "mail", "no emails found in the inbox");
            return Ok(None);
        };

        let message: GmailMessage = self
            .get_json(&format!("messages/{}", first.id), &[("format", "full")])
            .await?;
        let email = message.into_email();
        tracing::info!(
            target: "mail",
            id = %email.id,
            from = %email.sender,
            subject = %email.subject,
            "latest email fetched"
        );
        Ok(Some(email))
    }

    async fn apply(&self, id: &str, action: MailAction) -> Result<Value> {
        let ack = match action {
            MailAction::Star => {
                self.post_json(
                    &format!("messages/{id}/modify"),
                    json!({ "addLabelIds": ["STARRED"] }),
                )
                .await?
            }
            MailAction::MarkRead => {
                self.post_json(
                    &format!("messages/{id}/modify"),
                    json!({ "removeLabelIds": ["UNREAD"] }),
                )
                .await?
            }
            MailAction::Trash => {
                self.post_json(&format!("messages/{id}/trash"), json!({}))
                    .await?
            }
        };
        tracing::info!(target: "mail", id, action = %action, "mailbox updated");
        Ok(ack)
    }
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    id: String,
    #[serde(default)]
    internal_date: Option<String>,
    #[serde(default)]
    payload: MessagePart,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    body: PartBody,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct PartBody {
    #[serde(default)]
    data: Option<String>,
}

impl GmailMessage {
    fn into_email(self) -> Email {
        let payload = &self.payload;
        let subject = payload
            .header("Subject")
            .unwrap_or("(No Subject)")
            .to_string();
        let sender = payload.header("From").unwrap_or("(No From)").to_string();
        let body = if payload.parts.is_empty() {
            payload.body.data.as_deref().and_then(decode_body)
        } else {
            payload
                .find_plain_text()
                .or_else(|| payload.body.data.as_deref().and_then(decode_body))
        };
        let body = body.unwrap_or_default();
        let received_at = self
            .internal_date
            .as_deref()
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(DateTime::<Utc>::from_timestamp_millis);

        Email {
            sender,
            id: self.id,
            subject,
            body,
            received_at,
        }
    }
}

impl MessagePart {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// First `text/plain` body found depth-first through nested multiparts.
    fn find_plain_text(&self) -> Option<String> {
        self.parts.iter().find_map(|part| {
            if part.mime_type.eq_ignore_ascii_case("text/plain") {
                part.body.data.as_deref().and_then(decode_body)
            } else {
                part.find_plain_text()
            }
        })
    }
}

fn decode_body(data: &str) -> Option<String> {
    let trimmed = data.trim().trim_end_matches('=');
    match URL_SAFE_NO_PAD.decode(trimmed) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(err) => {
            tracing::warn!(target: "mail", error = %err, "undecodable message body");
            None
        }
    }
}
