//! Chat-completion access used for extraction and translation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::services::{AzureAuth, OpenAiSettings};
use crate::error::{PipelineError, Result};
use crate::utils::prometheus_metrics::SERVICE_ERRORS_TOTAL;

const SERVICE_NAME: &str = "Azure OpenAI";

/// One system + user exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub user_message: String,
    /// Ask the model for a JSON object response.
    pub json_mode: bool,
    pub max_output_tokens: u32,
}

#[async_trait]
pub trait LlmService: Send + Sync {
    /// Returns the assistant message text. Errors carry the service's own
    /// message so rate-limit markers survive.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    fn model(&self) -> &str;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

fn chat_body(request: &CompletionRequest) -> ChatRequest<'_> {
    ChatRequest {
        messages: vec![
            ChatMessage {
                role: "system",
                content: &request.system_instruction,
            },
            ChatMessage {
                role: "user",
                content: &request.user_message,
            },
        ],
        max_completion_tokens: request.max_output_tokens,
        response_format: request.json_mode.then_some(ResponseFormat {
            kind: "json_object",
        }),
    }
}

/// Extracts the first choice's content. A missing message is returned as "".
pub fn parse_chat_response(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| {
        PipelineError::ServiceError {
            service: SERVICE_NAME,
            message: format!("unexpected response body: {}", e),
        }
    })?;
    Ok(response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default())
}

/// Chat completions against an Azure OpenAI deployment.
pub struct AzureOpenAiClient {
    http: Client,
    settings: OpenAiSettings,
}

impl AzureOpenAiClient {
    pub fn new(settings: OpenAiSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self { http, settings })
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.deployment,
            self.settings.api_version
        )
    }

    fn service_error(message: String) -> PipelineError {
        SERVICE_ERRORS_TOTAL.with_label_values(&["llm"]).inc();
        PipelineError::ServiceError {
            service: SERVICE_NAME,
            message,
        }
    }
}

#[async_trait]
impl LlmService for AzureOpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let builder = self.http.post(self.url()).json(&chat_body(request));
        let builder = match &self.settings.auth {
            AzureAuth::ApiKey(key) => builder.header("api-key", key),
            AzureAuth::Bearer(token) => builder.bearer_auth(token),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| Self::service_error(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::service_error(format!(
                "request failed ({}): {}",
                status, body
            )));
        }
        let body = response.text().await.map_err(|e| {
            Self::service_error(format!("reading response failed: {}", e.without_url()))
        })?;

        debug!(
            deployment = %self.settings.deployment,
            response_bytes = body.len(),
            "Chat completion received"
        );
        parse_chat_response(&body)
    }

    fn model(&self) -> &str {
        &self.settings.deployment
    }
}
