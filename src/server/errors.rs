use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ai::AgentError;

/// HTTP boundary error; each variant maps to a fixed status and message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing one or more required fields: company_name, job_description, or job_requirements.")]
    MissingJobFields,

    #[error("Missing required field: document.")]
    MissingDocument,

    #[error("This endpoint only accepts POST requests.")]
    MethodNotAllowed,

    #[error("{0} is not configured on this server.")]
    NotConfigured(&'static str),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::MissingJobFields | AppError::MissingDocument => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, self.to_string()),
            AppError::NotConfigured(_) => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            AppError::Agent(err) => {
                tracing::error!(target: "server", error = %err, "agent call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "The AI agent could not process the request.".to_string(),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(target: "server", error = ?err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
