//! Structured-extraction service client.
//!
//! The pipeline requests a single JSON-mode chat completion per document.
//! [`CompletionProvider`] is the seam: the entity extractor drives the trait,
//! tests drive it with mocks, and [`AzureOpenAiProvider`] is the production
//! implementation speaking the Azure OpenAI chat-completions API over
//! `reqwest`.
//!
//! Retry/backoff deliberately does **not** live here — the provider reports
//! each attempt's outcome and [`crate::pipeline::extract`] owns the retry
//! budget, mirroring the split between transport and policy.

use crate::config::AzureConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// One failed provider attempt.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Request never completed (connect error, timeout, proxy failure).
    #[error("request failed: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The service answered 2xx but the completion was empty or not the
    /// JSON object that was requested.
    #[error("malformed service response: {0}")]
    Malformed(String),
}

/// A service that turns (instructions, document text) into a JSON object.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Request a JSON-mode completion; returns the parsed JSON object.
    async fn complete_json(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<Value, ProviderError>;
}

impl std::fmt::Debug for dyn CompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<dyn CompletionProvider>")
    }
}

// ── Azure OpenAI implementation ──────────────────────────────────────────

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Azure OpenAI chat-completions client.
///
/// Deterministic settings for extraction work: temperature 0 and
/// `response_format: json_object` so the model must emit one JSON object.
pub struct AzureOpenAiProvider {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl AzureOpenAiProvider {
    /// Build a client from Azure settings, optionally routed through an
    /// HTTPS proxy.
    pub fn new(
        config: &AzureConfig,
        proxy: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(timeout_secs));
        if let Some(proxy_url) = proxy {
            info!("routing extraction calls through proxy: {proxy_url}");
            let proxy =
                reqwest::Proxy::all(proxy_url).map_err(|e| ProviderError::Network(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            url: completion_url(config),
            api_key: config.api_key.clone(),
        })
    }
}

/// Azure's deployment-scoped chat-completions URL.
fn completion_url(config: &AzureConfig) -> String {
    format!(
        "{}/openai/deployments/{}/chat/completions?api-version={}",
        config.endpoint.trim_end_matches('/'),
        config.deployment,
        config.api_version
    )
}

#[async_trait]
impl CompletionProvider for AzureOpenAiProvider {
    async fn complete_json(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<Value, ProviderError> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        debug!(chars = user_text.len(), "sending extraction request");

        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Malformed("completion had no content".into()))?;

        serde_json::from_str(&content)
            .map_err(|e| ProviderError::Malformed(format!("completion is not JSON: {e}")))
    }
}
