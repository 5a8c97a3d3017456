use axum::{body::Bytes, extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::{
    ai::prompts,
    document::{understand, DocumentSource},
    domain::JobContext,
};

use super::{errors::AppError, state::AppState};

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "jobmail"
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateResumeRequest {
    #[serde(default)]
    company_name: Option<Value>,
    #[serde(default)]
    job_description: Option<Value>,
    #[serde(default)]
    job_requirements: Option<Value>,
    #[serde(default)]
    resume: Option<Value>,
}

impl UpdateResumeRequest {
    /// An empty body reads as `{}`. Anything other than a JSON object is `None`.
    fn from_body(body: &[u8]) -> Option<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Some(Self::default());
        }
        match serde_json::from_slice::<Map<String, Value>>(body) {
            Ok(fields) => serde_json::from_value(Value::Object(fields)).ok(),
            Err(err) => {
                tracing::debug!(target: "server", error = %err, "update-resume body is not a JSON object");
                None
            }
        }
    }
}

/// POST /update-resume. The body is parsed here rather than by the `Json`
/// extractor so every malformed request gets the same 400 message.
pub async fn update_resume(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let request = UpdateResumeRequest::from_body(&body).ok_or(AppError::MissingJobFields)?;
    let (Some(company_name), Some(job_description), Some(job_requirements)) = (
        request.company_name.filter(is_truthy),
        request.job_description.filter(is_truthy),
        request.job_requirements.filter(is_truthy),
    ) else {
        return Err(AppError::MissingJobFields);
    };

    tracing::info!(target: "server", company = %display(&company_name), "job data received");

    let mut body = Map::new();
    body.insert("status".into(), json!("success"));
    body.insert(
        "message".into(),
        json!("Data received and processed successfully."),
    );

    let resume = request.resume.filter(Value::is_object);
    if let (Some(resume), Some(updater)) = (resume, state.updater.as_ref()) {
        let job = JobContext {
            company_name: Some(display(&company_name)),
            requirements: requirement_list(&job_requirements),
            description: display(&job_description),
        };
        let updated = updater.update(&job, &resume, prompts::UPDATE_RESUME).await?;
        body.insert("updated_resume".into(), updated);
    }

    body.insert(
        "data_received".into(),
        json!({
            "company_name": company_name,
            "job_description": job_description,
            "job_requirements": job_requirements,
        }),
    );
    Ok(Json(Value::Object(body)))
}

/// POST /documents with the raw document as the request body.
pub async fn documents(
    State(state): State<AppState>,
    document: Bytes,
) -> Result<Json<Value>, AppError> {
    if document.is_empty() {
        return Err(AppError::MissingDocument);
    }
    let analyzer = state
        .analyzer
        .as_ref()
        .ok_or(AppError::NotConfigured("Document analysis"))?;

    tracing::info!(target: "server", bytes = document.len(), "document received for analysis");
    let text = understand(analyzer.as_ref(), DocumentSource::Bytes(document.to_vec())).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Document received and processed successfully.",
        "text": text,
    })))
}

pub async fn post_only() -> AppError {
    AppError::MethodNotAllowed
}

/// Presence check with the usual falsy values (null, "", [], {}, false, 0).
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn requirement_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(display).collect(),
        other => vec![display(other)],
    }
}
