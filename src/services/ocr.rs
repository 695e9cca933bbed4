//! Text extraction for scanned or digital PDFs.

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::services::{AzureAuth, DocumentIntelligenceSettings};
use crate::error::{PipelineError, Result};
use crate::utils::prometheus_metrics::SERVICE_ERRORS_TOTAL;

const SERVICE_NAME: &str = "Document Intelligence";
const API_VERSION: &str = "2023-07-31";

/// What the OCR service should read.
#[derive(Debug, Clone, Copy)]
pub enum OcrInput<'a> {
    Bytes(&'a [u8]),
    /// URL the service fetches on its own.
    Reference(&'a str),
}

#[async_trait]
pub trait OcrService: Send + Sync {
    /// Returns the recognised lines, page by page, in reading order.
    async fn extract_text(&self, input: OcrInput<'_>) -> Result<Vec<String>>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: String,
    analyze_result: Option<AnalyzeResult>,
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Deserialize)]
struct Page {
    #[serde(default)]
    lines: Vec<Line>,
}

#[derive(Deserialize)]
struct Line {
    content: String,
}

/// Outcome of one poll of the analyze operation.
#[derive(Debug, PartialEq)]
pub enum PollStatus {
    Running,
    Succeeded(Vec<String>),
}

pub fn parse_analyze_operation(body: &str) -> Result<PollStatus> {
    let operation: AnalyzeOperation =
        serde_json::from_str(body).map_err(|e| PipelineError::ServiceError {
            service: SERVICE_NAME,
            message: format!("unexpected analyze response: {}", e),
        })?;

    match operation.status.to_ascii_lowercase().as_str() {
        "notstarted" | "running" => Ok(PollStatus::Running),
        "succeeded" => {
            let lines = operation
                .analyze_result
                .map(|r| {
                    r.pages
                        .into_iter()
                        .flat_map(|p| p.lines.into_iter().map(|l| l.content))
                        .collect()
                })
                .unwrap_or_default();
            Ok(PollStatus::Succeeded(lines))
        }
        other => Err(PipelineError::ServiceError {
            service: SERVICE_NAME,
            message: format!(
                "analysis ended with status '{}': {}",
                other,
                operation.error.map(|e| e.to_string()).unwrap_or_default()
            ),
        }),
    }
}

/// Azure Document Intelligence `prebuilt-read` model.
pub struct DocumentIntelligenceClient {
    http: Client,
    settings: DocumentIntelligenceSettings,
    poll_interval: Duration,
    max_polls: u32,
}

impl DocumentIntelligenceClient {
    pub fn new(settings: DocumentIntelligenceSettings) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(120)).build()?;
        Ok(Self {
            http,
            settings,
            poll_interval: Duration::from_secs(1),
            max_polls: 300,
        })
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/formrecognizer/documentModels/prebuilt-read:analyze?api-version={}",
            self.settings.endpoint.trim_end_matches('/'),
            API_VERSION
        )
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.settings.auth {
            AzureAuth::ApiKey(key) => builder.header("Ocp-Apim-Subscription-Key", key),
            AzureAuth::Bearer(token) => builder.bearer_auth(token),
        }
    }

    fn service_error(message: String) -> PipelineError {
        SERVICE_ERRORS_TOTAL.with_label_values(&["ocr"]).inc();
        PipelineError::ServiceError {
            service: SERVICE_NAME,
            message,
        }
    }

    async fn submit(&self, input: OcrInput<'_>) -> Result<String> {
        let builder = self.http.post(self.analyze_url());
        let builder = match input {
            OcrInput::Bytes(bytes) => builder
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(bytes.to_vec()),
            OcrInput::Reference(url) => builder.json(&serde_json::json!({ "urlSource": url })),
        };

        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| {
                Self::service_error(format!("analyze request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::service_error(format!(
                "analyze request failed ({}): {}",
                status, body
            )));
        }

        response
            .headers()
            .get("Operation-Location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| Self::service_error("response had no Operation-Location".to_string()))
    }
}

#[async_trait]
impl OcrService for DocumentIntelligenceClient {
    async fn extract_text(&self, input: OcrInput<'_>) -> Result<Vec<String>> {
        let operation_url = self.submit(input).await?;
        debug!(operation = %operation_url, "Document analysis submitted");

        for _ in 0..self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .authorize(self.http.get(&operation_url))
                .send()
                .await
                .map_err(|e| Self::service_error(format!("poll failed: {}", e.without_url())))?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Self::service_error(format!(
                    "poll failed ({}): {}",
                    status, body
                )));
            }
            let body = response.text().await.map_err(|e| {
                Self::service_error(format!("reading poll response failed: {}", e.without_url()))
            })?;

            if let PollStatus::Succeeded(lines) = parse_analyze_operation(&body)? {
                return Ok(lines);
            }
        }

        Err(Self::service_error(format!(
            "analysis did not finish after {} polls",
            self.max_polls
        )))
    }
}
