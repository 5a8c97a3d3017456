//! OCR / layout analysis of uploaded documents.

mod client;

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

pub use client::DocumentIntelligenceClient;

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
    Url(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    #[serde(default)]
    pub languages: Vec<DetectedLanguage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paragraph {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectedLanguage {
    pub locale: String,
    #[serde(default)]
    pub confidence: f64,
}

#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, source: DocumentSource) -> Result<AnalyzeResult>;
}

/// Joins paragraph texts, each followed by a newline.
pub fn extract_text(result: &AnalyzeResult) -> String {
    result
        .paragraphs
        .iter()
        .fold(String::new(), |mut text, paragraph| {
            text.push_str(&paragraph.content);
            text.push('\n');
            text
        })
}

/// Analyzes a document and returns its paragraph text.
pub async fn understand(analyzer: &dyn DocumentAnalyzer, source: DocumentSource) -> Result<String> {
    let result = analyzer.analyze(source).await?;
    tracing::info!(
        target: "document",
        paragraphs = result.paragraphs.len(),
        languages = ?result
            .languages
            .iter()
            .map(|l| format!("{} ({:.2})", l.locale, l.confidence))
            .collect::<Vec<_>>(),
        "document analyzed"
    );
    Ok(extract_text(&result))
}
