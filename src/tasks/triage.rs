use std::{fmt, sync::Arc};

use anyhow::{Context, Result};

use crate::{
    domain::{ClassificationResult, Email, MailAction},
    infrastructure::notifier::Messenger,
    mail::MailProvider,
    resume::ResumeUpdater,
};

/// What a single triage pass did with the newest email.
#[derive(Debug, Clone, PartialEq)]
pub enum TriageOutcome {
    NoMail,
    Starred { id: String },
    Trashed { id: String },
    Forwarded { id: String, sid: String },
}

impl fmt::Display for TriageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriageOutcome::NoMail => write!(f, "no emails found"),
            TriageOutcome::Starred { id } => write!(f, "starred email {id}"),
            TriageOutcome::Trashed { id } => write!(f, "trashed email {id}"),
            TriageOutcome::Forwarded { id, sid } => {
                write!(f, "forwarded email {id} (message sid {sid})")
            }
        }
    }
}

/// Reads the newest email, classifies it and acts on the verdict:
/// qualifying replies are starred, rejections trashed, anything else is
/// forwarded to the messenger.
pub struct TriageProcessor {
    mailbox: Arc<dyn MailProvider>,
    updater: Arc<ResumeUpdater>,
    messenger: Arc<dyn Messenger>,
}

impl TriageProcessor {
    pub fn new(
        mailbox: Arc<dyn MailProvider>,
        updater: Arc<ResumeUpdater>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            mailbox,
            updater,
            messenger,
        }
    }

    pub async fn run_once(&self) -> Result<TriageOutcome> {
        let Some(email) = self.mailbox.latest().await? else {
            tracing::info!(target: "triage", "mailbox is empty; nothing to triage");
            return Ok(TriageOutcome::NoMail);
        };

        let verdict = self.classify(&email).await?;
        let label = verdict.map_or_else(|| "unset".to_string(), |v| v.to_string());
        tracing::info!(
            target: "triage",
            id = %email.id,
            from = %email.sender_address(),
            verdict = %label,
            "email classified"
        );
        self.dispatch(email, verdict).await
    }

    async fn classify(&self, email: &Email) -> Result<Option<ClassificationResult>> {
        if email.body.trim().is_empty() {
            tracing::info!(target: "triage", id = %email.id, "empty body; skipping classification");
            return Ok(None);
        }
        self.updater
            .classify(&email.body)
            .await
            .context("classification request failed")
    }

    async fn dispatch(
        &self,
        email: Email,
        verdict: Option<ClassificationResult>,
    ) -> Result<TriageOutcome> {
        match verdict {
            Some(ClassificationResult::Qualifying) => {
                self.mailbox.apply(&email.id, MailAction::Star).await?;
                Ok(TriageOutcome::Starred { id: email.id })
            }
            Some(ClassificationResult::Rejecting) => {
                self.mailbox.apply(&email.id, MailAction::Trash).await?;
                Ok(TriageOutcome::Trashed { id: email.id })
            }
            Some(ClassificationResult::Unrelated) | None => {
                let sid = self
                    .messenger
                    .send(&email.body)
                    .await
                    .with_context(|| format!("failed to forward email {}", email.id))?;
                Ok(TriageOutcome::Forwarded { id: email.id, sid })
            }
        }
    }
}
