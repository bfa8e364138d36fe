//! Google Generative Language API client
//!
//! Non-streaming `generateContent` calls. Every failure is classified into a
//! `ProviderError` so the executor can decide what is worth retrying.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};

use super::backend::{GenerationBackend, ProviderError};
use super::prompt::GenerationRequest;
use super::retry::parse_retry_after;
use super::strategy::ProviderStrategy;
use crate::constants;

/// HTTP backend for Gemini models
pub struct GeminiClient {
    http: Client,
    base_url: String,
    /// `None` fails every call without sending a request
    api_key: Option<String>,
}

impl GeminiClient {
    /// Create the HTTP client with connect and per-request timeouts
    fn create_http_client(request_timeout: Duration) -> Client {
        Client::builder()
            .user_agent(constants::http::USER_AGENT)
            .connect_timeout(constants::http::CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|e| {
                error!("Failed to build HTTP client: {}. Using default client.", e);
                Client::new()
            })
    }

    pub fn new(base_url: &str, api_key: Option<String>, request_timeout: Duration) -> Self {
        Self {
            http: Self::create_http_client(request_timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Endpoint for one strategy: `{base}/{version}/models/{model}:generateContent`
    pub fn endpoint(&self, strategy: &ProviderStrategy) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.base_url, strategy.api_version, strategy.model
        )
    }
}

/// Request body for one strategy
pub fn request_body(strategy: &ProviderStrategy, request: &GenerationRequest) -> Value {
    let mut body = serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [{"text": request.prompt()}]
        }],
        "generationConfig": {
            "temperature": request.temperature
        }
    });

    if strategy.structured_output {
        body["generationConfig"]["responseMimeType"] = serde_json::json!("application/json");
    }

    body
}

/// Concatenate the text parts of the first candidate
///
/// Returns `None` when the response has no candidate text at all (blocked
/// prompt, safety stop, or a shape change on the provider side).
pub fn extract_text(json: &Value) -> Option<String> {
    let parts = json
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|parts| parts.as_array())?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Network(e.to_string())
    }
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    async fn generate(
        &self,
        strategy: &ProviderStrategy,
        request: &GenerationRequest,
    ) -> Result<String, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::BadRequest("API key not configured".to_string()));
        };

        let url = self.endpoint(strategy);
        debug!(strategy = %strategy, category = %request.category, "Gemini generateContent");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("content-type", "application/json")
            .json(&request_body(strategy, request))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            let body = response.text().await.unwrap_or_default();
            debug!("Provider error response: {} - {}", status, body);
            return Err(ProviderError::from_status(
                status.as_u16(),
                &body,
                retry_after,
            ));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        extract_text(&json).ok_or_else(|| {
            let reason = json
                .get("promptFeedback")
                .and_then(|f| f.get("blockReason"))
                .and_then(|r| r.as_str())
                .unwrap_or("no candidate text");
            ProviderError::Malformed(reason.to_string())
        })
    }
}
