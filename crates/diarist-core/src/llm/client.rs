//! Chat completion client
//!
//! Async HTTP client for an OpenAI-compatible `/chat/completions` endpoint
//! (LM Studio and similar local hosts). One request, one response: no
//! retries, no streaming. The request timeout comes from configuration and
//! is reported as `Error::UpstreamTimeout` when exceeded.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::types::{ChatRequest, LlmResponse, Message};

const SERVICE: &str = "completion service";

/// A text completion service
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Send `messages` and return the model's reply
    async fn complete(&self, messages: Vec<Message>) -> Result<LlmResponse>;
}

/// Chat completion client
#[derive(Clone)]
pub struct LlmClient {
    /// HTTP client for making requests
    http_client: HttpClient,
    /// LLM configuration (model, temperature, etc.)
    config: LlmConfig,
    /// Optional bearer token; local hosts usually need none
    api_key: Option<String>,
    /// Base URL for the API
    base_url: String,
    /// Effective request timeout
    timeout_secs: u64,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("base_url", &self.base_url)
            .field("model", &self.config.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Builder for creating an LlmClient
#[derive(Default)]
pub struct LlmClientBuilder {
    config: Option<LlmConfig>,
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl LlmClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the LLM configuration
    pub fn config(mut self, config: LlmConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the base URL from the configuration
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Override the request timeout from the configuration
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Build the LlmClient
    pub fn build(self) -> Result<LlmClient> {
        let config = self.config.unwrap_or_default();
        let timeout_secs = self.timeout_secs.unwrap_or(config.timeout_secs);

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| config.base_url.clone())
            .trim_end_matches('/')
            .to_string();

        Ok(LlmClient {
            http_client,
            config,
            api_key: self.api_key,
            base_url,
            timeout_secs,
        })
    }
}

impl LlmClient {
    /// Create a new LlmClient with the given configuration
    pub fn new(config: LlmConfig) -> Result<Self> {
        LlmClientBuilder::new().config(config).build()
    }

    /// Create a new builder for LlmClient
    pub fn builder() -> LlmClientBuilder {
        LlmClientBuilder::new()
    }

    /// Model requested from the host
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Base URL of the host
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the host is up by listing its models
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/models", self.base_url);
        let mut builder = self.http_client.get(&url);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::from_transport(SERVICE, self.timeout_secs, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable {
                service: SERVICE,
                status: Some(status.as_u16()),
                message: format!("GET {} failed", url),
            });
        }
        Ok(())
    }

    /// Send a single request to the API
    async fn send_request(&self, request: &ChatRequest) -> Result<LlmResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let mut builder = self.http_client.post(&url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::from_transport(SERVICE, self.timeout_secs, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::from_transport(SERVICE, self.timeout_secs, e))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %body, "Chat completion failed");
            return Err(Error::UpstreamUnavailable {
                service: SERVICE,
                status: Some(status.as_u16()),
                message: truncate(&body, 500),
            });
        }

        let raw: Value = serde_json::from_str(&body).map_err(|e| {
            Error::MalformedModelOutput(format!("Response body is not JSON: {}", e))
        })?;

        let response = LlmResponse::from_raw(raw)
            .ok_or_else(|| Error::MalformedModelOutput("Response has no choices".to_string()))?;

        info!(model = %response.model, tokens = response.tokens_used, "Chat completion successful");
        Ok(response)
    }
}

#[async_trait]
impl TextCompletion for LlmClient {
    async fn complete(&self, messages: Vec<Message>) -> Result<LlmResponse> {
        let request = ChatRequest::new(&self.config.model, messages)
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        self.send_request(&request).await
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
