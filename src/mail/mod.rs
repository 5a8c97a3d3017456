pub mod auth;
mod gmail;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{Email, MailAction};

pub use gmail::GmailClient;

#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Newest message in the mailbox, or `None` when it is empty.
    async fn latest(&self) -> Result<Option<Email>>;

    /// Applies one mutation and returns the provider's acknowledgement.
    async fn apply(&self, id: &str, action: MailAction) -> Result<Value>;
}
