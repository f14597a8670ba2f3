//! OpenAiCompatProvider -- [`GenerativeProvider`] for OpenAI-compatible APIs.
//!
//! Sends non-streaming requests to a `/chat/completions` endpoint. One
//! client serves OpenAI itself and the many vendors that speak the same
//! wire format, selected via the base URL.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use keepsake_core::provider::generative::GenerativeProvider;
use keepsake_types::provider::{CompletionRequest, CompletionResponse, ProviderError, Usage};
use keepsake_types::session::TurnRole;

/// Generative provider for any OpenAI-compatible chat-completions API.
///
/// # API Key Security
///
/// The API key is stored as a [`SecretString`] and is only exposed when
/// constructing HTTP request headers. It never appears in Debug output,
/// Display output, or tracing logs.
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiCompatProvider {
    /// Create a new provider pointed at the official OpenAI endpoint.
    ///
    /// The transport timeout is deliberately generous; per-call deadlines
    /// are enforced by the caller.
    pub fn new(api_key: SecretString) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
        })
    }

    /// Override the base URL (vendor endpoints, local proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut url = base_url.into();
        while url.ends_with('/') {
            url.pop();
        }
        self.base_url = url;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// OpenAiCompatProvider intentionally does NOT derive Debug to prevent
// accidental exposure of internal state including the API key.

// ---------------------------------------------------------------------------
// Wire types (private to this module)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Deserialize)]
struct WireChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

fn to_wire_request<'a>(request: &'a CompletionRequest) -> WireRequest<'a> {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);

    if let Some(ref system) = request.system {
        messages.push(WireMessage {
            role: "system",
            content: system,
        });
    }

    for msg in &request.messages {
        let role = match msg.role {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        };
        messages.push(WireMessage {
            role,
            content: &msg.content,
        });
    }

    WireRequest {
        model: &request.model,
        messages,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
    }
}

fn response_from_wire(wire: WireResponse) -> CompletionResponse {
    let content = wire
        .choices
        .iter()
        .filter_map(|c| c.message.content.as_deref())
        .collect::<Vec<_>>()
        .join("");

    let usage = wire.usage.unwrap_or_default();

    CompletionResponse {
        id: wire.id,
        content,
        model: wire.model,
        usage: Usage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        },
    }
}

fn retry_after_ms(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|secs| secs * 1000)
}

// ---------------------------------------------------------------------------
// GenerativeProvider implementation
// ---------------------------------------------------------------------------

impl GenerativeProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let body = to_wire_request(request);
        let url = self.url("/chat/completions");

        let response = self
            .client
            .post(&url)
            .header(
                "authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => ProviderError::AuthenticationFailed,
                429 => ProviderError::RateLimited {
                    retry_after_ms: retry_after_ms(&response),
                },
                code => {
                    let error_body = response.text().await.unwrap_or_default();
                    ProviderError::Status {
                        status: code,
                        message: error_body,
                    }
                }
            });
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Deserialization(format!("failed to parse response: {e}")))?;

        Ok(response_from_wire(wire))
    }
}
