//! Mistral chat-completions provider.
//!
//! Direct integration with `POST {base_url}/v1/chat/completions` via
//! `reqwest`. Implements [`CompletionGateway`] and owns the gateway-side
//! policy the resolver deliberately leaves out:
//!
//! - Bearer-token authentication
//! - Per-request timeout
//! - Retry with exponential backoff on transport errors, 429 and 5xx
//! - Immediate failure on other 4xx responses

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llms::base_llm::{ChatMessage, Completion, CompletionChoice, CompletionGateway, GatewayError};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";

/// Default model.
pub const DEFAULT_MODEL: &str = "mistral-medium";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Request body for the chat-completions endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    pub stream: bool,
    pub safe_prompt: bool,
    pub random_seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ResponseChoice>,
    #[serde(default)]
    usage: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// MistralCompletion
// ---------------------------------------------------------------------------

/// Mistral completion gateway.
///
/// # Example
///
/// ```rust,no_run
/// use rebot::llms::providers::mistral::MistralCompletion;
///
/// let gateway = MistralCompletion::new(Some("sk-...".to_string()))
///     .with_model("mistral-small-latest")
///     .with_max_retries(2);
/// ```
#[derive(Debug, Clone)]
pub struct MistralCompletion {
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
    safe_prompt: bool,
    random_seed: Option<u64>,
    timeout: Duration,
    max_retries: u32,
    initial_backoff: Duration,
    client: reqwest::Client,
}

impl MistralCompletion {
    /// Create a provider with default settings.
    ///
    /// Falls back to the `MISTRAL_API_KEY` environment variable when no key
    /// is passed.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.or_else(|| std::env::var("MISTRAL_API_KEY").ok()),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: 500,
            safe_prompt: false,
            random_seed: None,
            timeout: Duration::from_secs(120),
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_safe_prompt(mut self, safe_prompt: bool) -> Self {
        self.safe_prompt = safe_prompt;
        self
    }

    pub fn with_random_seed(mut self, random_seed: Option<u64>) -> Self {
        self.random_seed = random_seed;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before the first retry; doubles on each further attempt.
    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Build the JSON request body.
    pub fn build_request<'a>(&'a self, messages: &'a [ChatMessage]) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            stream: false,
            safe_prompt: self.safe_prompt,
            random_seed: self.random_seed,
        }
    }

    fn parse_response(&self, body: &str) -> Result<Completion, GatewayError> {
        let response: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
            GatewayError::Decode(format!(
                "{} - Body: {}",
                e,
                &body[..floor_char_boundary(body, 500)]
            ))
        })?;

        if let Some(usage) = &response.usage {
            log::debug!("Mistral usage: model={}, usage={}", self.model, usage);
        }

        Ok(Completion {
            choices: response
                .choices
                .into_iter()
                .map(|c| CompletionChoice {
                    content: c.message.content.unwrap_or_default(),
                })
                .collect(),
        })
    }
}

#[async_trait]
impl CompletionGateway for MistralCompletion {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<Completion, GatewayError> {
        let api_key = self.api_key.as_deref().ok_or(GatewayError::MissingApiKey)?;
        let body = self.build_request(&messages);
        let endpoint = self.endpoint();

        log::debug!(
            "Sending request to Mistral API: model={}, messages={}",
            self.model,
            messages.len()
        );

        let mut last_error: Option<GatewayError> = None;
        let mut retry_delay = self.initial_backoff;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                log::warn!(
                    "Mistral API retry attempt {} after {:?}",
                    attempt,
                    retry_delay
                );
                tokio::time::sleep(retry_delay).await;
                retry_delay *= 2;
            }

            let response = match self
                .client
                .post(&endpoint)
                .timeout(self.timeout)
                .bearer_auth(api_key)
                .header("Accept", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(GatewayError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    last_error = Some(GatewayError::Http(e));
                    continue;
                }
            };

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                last_error = Some(GatewayError::Status {
                    status: status.as_u16(),
                    body: text,
                });
                continue;
            }

            if !status.is_success() {
                return Err(GatewayError::Status {
                    status: status.as_u16(),
                    body: text,
                });
            }

            log::debug!("Received response from Mistral API");
            return self.parse_response(&text);
        }

        Err(last_error.unwrap_or_else(|| {
            GatewayError::Decode("Mistral API call failed after all retries".to_string())
        }))
    }
}

/// Largest index `<= max` that falls on a char boundary.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
