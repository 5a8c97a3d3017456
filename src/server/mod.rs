mod errors;
mod handlers;
mod state;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::infrastructure::shutdown::ShutdownSignal;

pub use state::AppState;

const MAX_DOCUMENT_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/update-resume",
            post(handlers::update_resume).fallback(handlers::post_only),
        )
        .route(
            "/documents",
            post(handlers::documents)
                .fallback(handlers::post_only)
                .layer(DefaultBodyLimit::max(MAX_DOCUMENT_BYTES)),
        )
        .with_state(state)
}

/// Serves until the shutdown signal fires, then drains in-flight requests.
pub async fn serve(state: AppState, addr: &str, shutdown: ShutdownSignal) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("invalid SERVER_ADDR {addr}"))?;
    let app = build_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(target: "server", %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.wait())
        .await?;
    tracing::info!(target: "server", "server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        resume::ResumeUpdater,
        testing::{ScriptedAgent, StaticAnalyzer},
    };

    async fn call(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = call(AppState::default(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn missing_job_fields_is_bad_request() {
        let request = post_json(
            "/update-resume",
            json!({"company_name": "Contoso", "job_description": "", "job_requirements": ["SQL"]}),
        );
        let (status, body) = call(AppState::default(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"error": "Missing one or more required fields: company_name, job_description, or job_requirements."})
        );
    }

    #[tokio::test]
    async fn empty_or_malformed_body_gets_fixed_message() {
        let expected = json!({"error": "Missing one or more required fields: company_name, job_description, or job_requirements."});

        let request = Request::post("/update-resume").body(Body::empty()).unwrap();
        let (status, body) = call(AppState::default(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, expected);

        let request = Request::post("/update-resume")
            .header("content-type", "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let (status, body) = call(AppState::default(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn json_without_content_type_is_accepted() {
        let request = Request::post("/update-resume")
            .body(Body::from(
                json!({"company_name": "Contoso", "job_description": "Analyst role", "job_requirements": "SQL"})
                    .to_string(),
            ))
            .unwrap();
        let (status, body) = call(AppState::default(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data_received"]["company_name"], "Contoso");
    }

    #[tokio::test]
    async fn job_data_is_echoed_back() {
        let request = post_json(
            "/update-resume",
            json!({
                "company_name": "Contoso",
                "job_description": "Analyst role",
                "job_requirements": ["SQL", "Power BI"]
            }),
        );
        let (status, body) = call(AppState::default(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Data received and processed successfully.");
        assert_eq!(body["data_received"]["job_requirements"], json!(["SQL", "Power BI"]));
        assert!(body.get("updated_resume").is_none());
    }

    #[tokio::test]
    async fn resume_is_updated_when_agent_is_configured() {
        let agent = Arc::new(ScriptedAgent::replying(&[r#"{"name": "Jane", "skills": {"programming": ["SQL"]}}"#]));
        let state = AppState {
            updater: Some(Arc::new(ResumeUpdater::new(agent.clone()))),
            analyzer: None,
        };
        let request = post_json(
            "/update-resume",
            json!({
                "company_name": "Contoso",
                "job_description": "Analyst role",
                "job_requirements": "SQL",
                "resume": {"name": "Jane"}
            }),
        );
        let (status, body) = call(state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updated_resume"]["skills"]["programming"], json!(["SQL"]));
        assert!(agent.last_sent().unwrap().contains("\"job_description\": \"Analyst role\""));
    }

    #[tokio::test]
    async fn invalid_agent_reply_is_bad_gateway() {
        let agent = Arc::new(ScriptedAgent::replying(&["sorry, I cannot do that"]));
        let state = AppState {
            updater: Some(Arc::new(ResumeUpdater::new(agent))),
            analyzer: None,
        };
        let request = post_json(
            "/update-resume",
            json!({
                "company_name": "Contoso",
                "job_description": "Analyst role",
                "job_requirements": ["SQL"],
                "resume": {"name": "Jane"}
            }),
        );
        let (status, _) = call(state, request).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn get_on_post_route_is_not_allowed() {
        let request = Request::get("/update-resume").body(Body::empty()).unwrap();
        let (status, body) = call(AppState::default(), request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "This endpoint only accepts POST requests.");
    }

    #[tokio::test]
    async fn empty_document_is_bad_request() {
        let request = Request::post("/documents").body(Body::empty()).unwrap();
        let (status, body) = call(AppState::default(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required field: document.");
    }

    #[tokio::test]
    async fn document_text_is_returned() {
        let analyzer = Arc::new(StaticAnalyzer::new(vec!["Jane Doe", "Analyst"]));
        let state = AppState {
            updater: None,
            analyzer: Some(analyzer.clone()),
        };
        let request = Request::post("/documents")
            .header("content-type", "application/pdf")
            .body(Body::from(b"%PDF-1.4 fake".to_vec()))
            .unwrap();
        let (status, body) = call(state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Jane Doe\nAnalyst\n");
        assert_eq!(
            analyzer.seen.lock().as_slice(),
            &[crate::document::DocumentSource::Bytes(b"%PDF-1.4 fake".to_vec())]
        );
    }

    #[tokio::test]
    async fn document_without_analyzer_is_unavailable() {
        let request = Request::post("/documents").body(Body::from("data")).unwrap();
        let (status, _) = call(AppState::default(), request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
