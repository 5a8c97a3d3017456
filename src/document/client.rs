use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use serde::Deserialize;
use serde_json::json;
use tokio::time::sleep;

use crate::config::UnderstanderConfig;

use super::{AnalyzeResult, DocumentAnalyzer, DocumentSource};

const READ_MODEL: &str = "prebuilt-read";
const API_VERSION: &str = "2023-07-31";
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Azure AI Document Intelligence client running the prebuilt read model.
pub struct DocumentIntelligenceClient {
    http: Client,
    endpoint: String,
    key: String,
    poll_interval: Duration,
}

impl DocumentIntelligenceClient {
    pub fn new(http: Client, config: &UnderstanderConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_ref()
            .context("UNDERSTANDER_ENDPOINT must be configured for document analysis")?;
        let key = config
            .key
            .clone()
            .context("UNDERSTANDER_KEY must be configured for document analysis")?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key,
            poll_interval: config.poll_interval,
        })
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/formrecognizer/documentModels/{READ_MODEL}:analyze?api-version={API_VERSION}&features=languages",
            self.endpoint
        )
    }

    async fn submit(&self, source: DocumentSource) -> Result<String> {
        let request = self.http.post(self.analyze_url()).header(KEY_HEADER, &self.key);
        let request = match source {
            DocumentSource::Url(url) => request.json(&json!({ "urlSource": url })),
            DocumentSource::Bytes(bytes) => request
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(bytes),
            DocumentSource::Path(path) => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("failed to read document {}", path.display()))?;
                request
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .body(bytes)
            }
        };

        let response = check_status(request.send().await?).await?;
        let operation = response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| anyhow!("analyze response did not include an Operation-Location header"))?
            .to_string();
        Ok(operation)
    }

    async fn wait_for_result(&self, operation: &str) -> Result<AnalyzeResult> {
        loop {
            let response = self
                .http
                .get(operation)
                .header(KEY_HEADER, &self.key)
                .send()
                .await?;
            let status: OperationStatus = check_status(response).await?.json().await?;
            match status.status.as_str() {
                "succeeded" => {
                    return status
                        .analyze_result
                        .ok_or_else(|| anyhow!("analysis succeeded without a result"))
                }
                "failed" => {
                    let detail = status
                        .error
                        .map(|e| format!("{}: {}", e.code, e.message))
                        .unwrap_or_else(|| "no error detail".to_string());
                    bail!("document analysis failed ({detail})");
                }
                other => {
                    tracing::debug!(target: "document", status = other, "analysis pending");
                    sleep(self.poll_interval).await;
                }
            }
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for DocumentIntelligenceClient {
    async fn analyze(&self, source: DocumentSource) -> Result<AnalyzeResult> {
        let operation = self.submit(source).await?;
        tracing::info!(target: "document", "document submitted for analysis");
        self.wait_for_result(&operation).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationStatus {
    status: String,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ServiceError,
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => bail!(
            "document analysis request failed ({status}): {} {}",
            envelope.error.code,
            envelope.error.message
        ),
        Err(_) => bail!("document analysis request failed ({status}): {body}"),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, sync::Arc};

    use axum::{
        body::Bytes,
        http::{header::HOST, HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use parking_lot::Mutex;
    use serde_json::Value;

    use super::*;
    use crate::testing::{serve_stub, stub_client};

    #[derive(Default)]
    struct Recorded {
        key: Option<String>,
        content_type: Option<String>,
        body: Vec<u8>,
    }

    /// Read service that accepts any analyze POST and answers operation polls
    /// from `polls` in order, then keeps reporting "running".
    fn read_service(polls: Vec<Value>) -> (Router, Arc<Mutex<Recorded>>) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let polls = Arc::new(Mutex::new(VecDeque::from(polls)));
        let seen = recorded.clone();
        let router = Router::new()
            .route(
                "/operations/op-1",
                get(move || {
                    let polls = polls.clone();
                    async move {
                        let next = polls.lock().pop_front();
                        Json(next.unwrap_or_else(|| json!({"status": "running"})))
                    }
                }),
            )
            .fallback(move |headers: HeaderMap, body: Bytes| {
                let seen = seen.clone();
                async move {
                    let header = |name: &str| {
                        headers
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string)
                    };
                    {
                        let mut seen = seen.lock();
                        seen.key = header(KEY_HEADER);
                        seen.content_type = header("content-type");
                        seen.body = body.to_vec();
                    }
                    let host = header(HOST.as_str()).unwrap_or_default();
                    (
                        StatusCode::ACCEPTED,
                        [("operation-location", format!("http://{host}/operations/op-1"))],
                    )
                }
            });
        (router, recorded)
    }

    async fn client_for(router: Router) -> DocumentIntelligenceClient {
        let config = UnderstanderConfig {
            endpoint: Some(serve_stub(router).await),
            key: Some("secret-key".into()),
            poll_interval: Duration::from_millis(5),
        };
        DocumentIntelligenceClient::new(stub_client(), &config).unwrap()
    }

    #[tokio::test]
    async fn bytes_are_submitted_and_polled_until_succeeded() {
        let (router, recorded) = read_service(vec![
            json!({"status": "notStarted"}),
            json!({"status": "running"}),
            json!({"status": "succeeded", "analyzeResult": {
                "paragraphs": [{"content": "Meera Nair"}, {"content": "Data Analyst"}],
                "languages": [{"locale": "en", "confidence": 0.95}]
            }}),
        ]);
        let client = client_for(router).await;

        let result = client
            .analyze(DocumentSource::Bytes(b"%PDF-1.7".to_vec()))
            .await
            .unwrap();
        assert_eq!(result.paragraphs.len(), 2);
        assert_eq!(result.languages[0].locale, "en");

        let recorded = recorded.lock();
        assert_eq!(recorded.key.as_deref(), Some("secret-key"));
        assert_eq!(recorded.content_type.as_deref(), Some("application/octet-stream"));
        assert_eq!(recorded.body, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn url_source_is_sent_as_json() {
        let (router, recorded) = read_service(vec![json!({"status": "succeeded", "analyzeResult": {}})]);
        let client = client_for(router).await;

        client
            .analyze(DocumentSource::Url("https://example.com/cv.png".into()))
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&recorded.lock().body).unwrap();
        assert_eq!(body, json!({"urlSource": "https://example.com/cv.png"}));
    }

    #[tokio::test]
    async fn failed_operation_reports_service_error() {
        let (router, _) = read_service(vec![json!({
            "status": "failed",
            "error": {"code": "InvalidContent", "message": "The file is corrupted."}
        })]);
        let client = client_for(router).await;

        let err = client
            .analyze(DocumentSource::Bytes(b"garbage".to_vec()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("InvalidContent: The file is corrupted."));
    }

    #[test]
    fn missing_key_is_reported() {
        let config = UnderstanderConfig {
            endpoint: Some("https://di.example.cognitiveservices.azure.com/".into()),
            key: None,
            poll_interval: Duration::from_millis(10),
        };
        let err = DocumentIntelligenceClient::new(Client::new(), &config)
            .err()
            .unwrap();
        assert!(err.to_string().contains("UNDERSTANDER_KEY"));
    }

    #[test]
    fn analyze_url_targets_read_model() {
        let config = UnderstanderConfig {
            endpoint: Some("https://di.example.cognitiveservices.azure.com/".into()),
            key: Some("k".into()),
            poll_interval: Duration::from_millis(10),
        };
        let client = DocumentIntelligenceClient::new(Client::new(), &config).unwrap();
        assert_eq!(
            client.analyze_url(),
            "https://di.example.cognitiveservices.azure.com/formrecognizer/documentModels/prebuilt-read:analyze?api-version=2023-07-31&features=languages"
        );
    }

    #[test]
    fn operation_status_carries_result() {
        let status: OperationStatus = serde_json::from_str(
            r#"{"status": "succeeded", "analyzeResult": {"apiVersion": "2023-07-31", "content": "a", "paragraphs": [{"content": "a"}]}}"#,
        )
        .unwrap();
        assert_eq!(status.analyze_result.unwrap().paragraphs.len(), 1);
    }
}
