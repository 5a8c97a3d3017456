use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static ANGLE_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([^<>@\s]+@[^<>\s]+)>").expect("valid address regex"));

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Email {
    /// Raw `From` header, e.g. `Jane Recruiter <jane@corp.example>`.
    pub sender: String,
    pub id: String,
    pub subject: String,
    pub body: String,
    pub received_at: Option<DateTime<Utc>>,
}

impl Email {
    pub fn sender_address(&self) -> &str {
        ANGLE_ADDRESS
            .captures(&self.sender)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .unwrap_or_else(|| self.sender.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(sender: &str) -> Email {
        Email {
            sender: sender.to_string(),
            id: "18f".into(),
            subject: "s".into(),
            body: String::new(),
            received_at: None,
        }
    }

    #[test]
    fn sender_address_unwraps_display_name() {
        assert_eq!(
            email("Talent Team <careers@corp.example>").sender_address(),
            "careers@corp.example"
        );
    }

    #[test]
    fn sender_address_keeps_bare_address() {
        assert_eq!(email(" jobs@corp.example ").sender_address(), "jobs@corp.example");
    }
}
