//! Chat completions client — text generation over an OpenAI-compatible API
//!
//! Provides a `CompletionBackend` trait and `ChatCompletionClient`, which calls
//! `POST {base_url}/chat/completions` with one user message and returns the
//! first choice's content verbatim. Defaults target Groq.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;

use crate::config::CompletionSettings;

// ============================================================================
// CompletionBackend trait
// ============================================================================

/// One generation request: a single user-role prompt and a sampling temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
        }
    }
}

/// Abstraction over text-generation providers.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generate text for the request, returning the completion unmodified.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;

    /// Model identifier for logging and health output.
    fn model(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

/// Completion errors
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Response contained no choices")]
    EmptyResponse,

    #[error("Missing API key (set {env_var})")]
    MissingApiKey { env_var: String },
}

impl CompletionError {
    /// Transport failures, rate limits and server errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            CompletionError::Http(_) => true,
            CompletionError::Api { code, .. } => *code == 429 || *code >= 500,
            CompletionError::EmptyResponse | CompletionError::MissingApiKey { .. } => false,
        }
    }
}

// ============================================================================
// Config
// ============================================================================

/// Chat completions client configuration
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
}

impl CompletionConfig {
    pub fn new(api_key: impl Into<String>, settings: &CompletionSettings) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(settings.timeout_seconds),
            max_retries: settings.max_retries,
            retry_delay_ms: settings.retry_delay_ms,
        }
    }

    /// Build from settings, reading the key from the configured environment variable.
    pub fn from_env(settings: &CompletionSettings) -> Result<Self, CompletionError> {
        let api_key = std::env::var(&settings.api_key_env).unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(CompletionError::MissingApiKey {
                env_var: settings.api_key_env.clone(),
            });
        }
        Ok(Self::new(api_key, settings))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

// ============================================================================
// Wire structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ============================================================================
// ChatCompletionClient
// ============================================================================

/// Chat completions client for Groq and other OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    client: Client,
    config: CompletionConfig,
}

impl ChatCompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        if config.api_key().is_empty() {
            return Err(CompletionError::MissingApiKey {
                env_var: "api_key".to_string(),
            });
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    async fn complete_once(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key())
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(error_body);

            tracing::error!(code = status.as_u16(), message = %message, "Completion API error");

            return Err(CompletionError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await?;

        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(CompletionError::EmptyResponse)
    }
}

#[async_trait]
impl CompletionBackend for ChatCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let retry_strategy = ExponentialBackoff::from_millis(self.config.retry_delay_ms)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.config.max_retries);

        RetryIf::spawn(
            retry_strategy,
            || self.complete_once(request),
            CompletionError::is_retryable,
        )
        .await
        .inspect_err(|e| {
            tracing::error!(
                retries = self.config.max_retries,
                error = %e,
                "Completion request failed"
            );
        })
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// ============================================================================
// TESTS
// ============================================================================
