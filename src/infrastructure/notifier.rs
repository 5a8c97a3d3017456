use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::MessagingConfig;

const TWILIO_API_URL: &str = "https://api.twilio.com/2010-04-01";

/// Outbound text channel for emails the classifier did not act on.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Delivers `body` and returns the provider's message id.
    async fn send(&self, body: &str) -> Result<String>;
}

/// WhatsApp delivery through Twilio's Messages API.
pub struct TwilioWhatsApp {
    http: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from: String,
    to: String,
}

impl TwilioWhatsApp {
    pub fn new(http: Client, config: &MessagingConfig) -> Result<Self> {
        let account_sid = config
            .account_sid
            .clone()
            .context("TWILIO_ACCOUNT_SID must be configured to forward messages")?;
        let auth_token = config
            .auth_token
            .clone()
            .context("TWILIO_AUTH_TOKEN must be configured to forward messages")?;
        let from = config
            .from_number
            .as_deref()
            .context("WHATSAPP_FROM must be configured to forward messages")?;
        let to = config
            .to_number
            .as_deref()
            .context("WHATSAPP_TO must be configured to forward messages")?;
        Ok(Self {
            http,
            base_url: TWILIO_API_URL.to_string(),
            account_sid,
            auth_token,
            from: whatsapp_address(from),
            to: whatsapp_address(to),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", self.base_url, self.account_sid)
    }
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
}

#[async_trait]
impl Messenger for TwilioWhatsApp {
    async fn send(&self, body: &str) -> Result<String> {
        let form = [
            ("From", self.from.as_str()),
            ("To", self.to.as_str()),
            ("Body", body),
        ];
        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(target: "notifier", %status, error = %error_text, "whatsapp delivery failed");
            bail!("whatsapp delivery failed ({status}): {error_text}");
        }
        let message: MessageResource = response.json().await?;
        tracing::info!(target: "notifier", sid = %message.sid, "whatsapp message sent");
        Ok(message.sid)
    }
}

fn whatsapp_address(number: &str) -> String {
    let number = number.trim();
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{number}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MessagingConfig {
        MessagingConfig {
            account_sid: Some("AC123".into()),
            auth_token: Some("secret".into()),
            from_number: Some("+14155238886".into()),
            to_number: Some("whatsapp:+15550100".into()),
        }
    }

    #[test]
    fn numbers_get_whatsapp_prefix_once() {
        let messenger = TwilioWhatsApp::new(Client::new(), &config()).unwrap();
        assert_eq!(messenger.from, "whatsapp:+14155238886");
        assert_eq!(messenger.to, "whatsapp:+15550100");
        assert_eq!(
            messenger.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn missing_recipient_is_reported() {
        let mut config = config();
        config.to_number = None;
        let err = TwilioWhatsApp::new(Client::new(), &config).err().unwrap();
        assert!(err.to_string().contains("WHATSAPP_TO"));
    }
}
