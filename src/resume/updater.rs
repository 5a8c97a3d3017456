use std::sync::Arc;

use serde_json::{json, Value};

use crate::{
    ai::{
        inference::{parse_classification, parse_json_object},
        prompts, AgentConversation, AgentError,
    },
    domain::{ClassificationResult, JobContext, MatchScore},
};

/// Email classification, job-match scoring and résumé tailoring against the
/// updating agent. Every call opens its own agent thread.
pub struct ResumeUpdater {
    agent: Arc<dyn AgentConversation>,
}

impl ResumeUpdater {
    pub fn new(agent: Arc<dyn AgentConversation>) -> Self {
        Self { agent }
    }

    /// Returns `None` when the reply is not a bare 0, 1 or 2.
    pub async fn classify(&self, body: &str) -> Result<Option<ClassificationResult>, AgentError> {
        let message = format!("{}{}", prompts::CLASSIFY_EMAIL, body);
        let reply = self.agent.send(&message).await?;
        match parse_classification(&reply) {
            Ok(result) => {
                tracing::info!(target: "agent", classification = %result, "email classified");
                Ok(Some(result))
            }
            Err(err) => {
                tracing::warn!(target: "agent", error = %err, raw = %reply, "failed to parse classification reply");
                Ok(None)
            }
        }
    }

    pub async fn match_score(
        &self,
        job: &JobContext,
        resume: &Value,
        instruction: &str,
    ) -> Result<Option<MatchScore>, AgentError> {
        let reply = self.agent.send(&build_message(instruction, job, resume)).await?;
        let parsed = parse_json_object(&reply)
            .and_then(|map| {
                serde_json::from_value::<MatchScore>(Value::Object(map))
                    .map_err(|err| AgentError::UnexpectedReply(err.to_string()))
            });
        match parsed {
            Ok(score) => Ok(Some(score)),
            Err(err) => {
                tracing::warn!(target: "agent", error = %err, raw = %reply, "failed to decode match score reply");
                Ok(None)
            }
        }
    }

    /// Returns the agent's résumé object exactly as parsed. A reply that is not a
    /// JSON object is an error; no partial structure is ever returned.
    pub async fn update(
        &self,
        job: &JobContext,
        resume: &Value,
        instruction: &str,
    ) -> Result<Value, AgentError> {
        let reply = self.agent.send(&build_message(instruction, job, resume)).await?;
        match parse_json_object(&reply) {
            Ok(map) => {
                tracing::info!(target: "agent", fields = map.len(), "updated resume received from agent");
                Ok(Value::Object(map))
            }
            Err(err) => {
                tracing::warn!(target: "agent", error = %err, raw = %reply, "failed to decode updated resume");
                Err(AgentError::InvalidResume(err.to_string()))
            }
        }
    }
}

fn build_message(instruction: &str, job: &JobContext, resume: &Value) -> String {
    let payload = json!({
        "job_requirements": job.requirements,
        "job_description": job.description,
        "resume": resume,
    });
    let body = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());
    format!("{instruction}{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_resume, ScriptedAgent};

    fn job() -> JobContext {
        serde_json::from_str(include_str!("../fixtures/job.json")).unwrap()
    }

    fn updater_with(replies: &[&str]) -> (Arc<ScriptedAgent>, ResumeUpdater) {
        let agent = Arc::new(ScriptedAgent::replying(replies));
        (agent.clone(), ResumeUpdater::new(agent))
    }

    #[tokio::test]
    async fn classify_reads_bare_digit() {
        let (agent, updater) = updater_with(&["1"]);
        let result = updater.classify("We'd like to schedule an interview").await.unwrap();
        assert_eq!(result, Some(ClassificationResult::Qualifying));
        let sent = agent.last_sent().unwrap();
        assert!(sent.starts_with(prompts::CLASSIFY_EMAIL));
        assert!(sent.ends_with("We'd like to schedule an interview"));
    }

    #[tokio::test]
    async fn classify_leaves_result_unset_for_prose() {
        let (_, updater) = updater_with(&["Not sure, maybe 1?"]);
        assert_eq!(updater.classify("body").await.unwrap(), None);

        let (_, updater) = updater_with(&["approved"]);
        assert_eq!(updater.classify("body").await.unwrap(), None);
    }

    #[tokio::test]
    async fn classify_propagates_transport_failure() {
        let (_, updater) = updater_with(&[]);
        assert!(matches!(
            updater.classify("body").await,
            Err(AgentError::NoAssistantReply)
        ));
    }

    #[tokio::test]
    async fn update_returns_reply_object_unchanged() {
        let updated = r#"{"name": "Meera Nair", "summary": "Python and Azure ML engineer", "extra": {"k": [1, 2]}}"#;
        let (agent, updater) = updater_with(&[updated]);
        let result = updater
            .update(&job(), &sample_resume(), prompts::UPDATE_RESUME)
            .await
            .unwrap();
        let expected: Value = serde_json::from_str(updated).unwrap();
        assert_eq!(result, expected);

        let sent = agent.last_sent().unwrap();
        assert!(sent.starts_with(prompts::UPDATE_RESUME));
        let payload: Value = serde_json::from_str(&sent[prompts::UPDATE_RESUME.len()..]).unwrap();
        assert_eq!(payload["job_requirements"].as_array().unwrap().len(), 5);
        assert_eq!(payload["resume"], sample_resume());
    }

    #[tokio::test]
    async fn update_fails_on_non_json_reply() {
        for reply in ["Sure! Here is the resume you asked for.", "[1,2,3]", "{\"name\": "] {
            let (_, updater) = updater_with(&[reply]);
            let result = updater.update(&job(), &sample_resume(), prompts::UPDATE_RESUME).await;
            assert!(matches!(result, Err(AgentError::InvalidResume(_))), "reply {reply:?}");
        }
    }

    #[tokio::test]
    async fn match_score_defaults_missing_fields() {
        let (_, updater) = updater_with(&[r#"{"match_percentage": 64}"#]);
        let score = updater
            .match_score(&job(), &sample_resume(), prompts::MATCH_SCORE)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(score.match_percentage, 64.0);
        assert!(score.matched_skills.is_empty());
    }

    #[tokio::test]
    async fn match_score_accepts_loosely_typed_values() {
        for reply in [
            r#"{"match_percentage": "64%", "matched_skills": ["Azure"]}"#,
            r#"{"match_percentage": 64, "matched_skills": "Azure"}"#,
        ] {
            let (_, updater) = updater_with(&[reply]);
            let score = updater
                .match_score(&job(), &sample_resume(), prompts::MATCH_SCORE)
                .await
                .unwrap();
            assert_eq!(
                score,
                Some(MatchScore {
                    match_percentage: 64.0,
                    matched_skills: vec!["Azure".into()],
                }),
                "reply {reply}"
            );
        }
    }

    #[tokio::test]
    async fn match_score_unset_on_malformed_reply() {
        let (_, updater) = updater_with(&["about 60 percent"]);
        let score = updater
            .match_score(&job(), &sample_resume(), prompts::MATCH_SCORE)
            .await
            .unwrap();
        assert_eq!(score, None);
    }
}
