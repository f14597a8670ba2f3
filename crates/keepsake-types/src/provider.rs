//! Generative provider request/response types for Keepsake.
//!
//! These types model the data shapes for provider interactions: completion
//! requests, the classified outcome of a raw provider call, and the
//! reconciled reply the engine hands back to the application layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::session::TurnRole;

/// A single message in a provider conversation.
///
/// The system prompt travels in [`CompletionRequest::system`], so messages
/// only ever carry the user/assistant roles of the interview itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: TurnRole,
    pub content: String,
}

/// Request to a generative provider for a completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Response from a generative provider for a completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub usage: Usage,
}

/// Token usage for a completion request/response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Errors from generative provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("no provider configured")]
    NotConfigured,
}

impl ProviderError {
    /// HTTP status carried by this error, when one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            ProviderError::RateLimited { .. } => Some(429),
            ProviderError::AuthenticationFailed => Some(401),
            _ => None,
        }
    }
}

/// The structured payload a well-behaved provider returns.
///
/// Every field is optional: providers drop fields, rename them, or wrap
/// the object in prose, and parsing must tolerate all of it. Both
/// `end_intent` and `endIntent` spellings are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredReply {
    #[serde(default)]
    pub reply: Option<String>,

    #[serde(default)]
    pub transcript: Option<String>,

    #[serde(default)]
    pub question: Option<String>,

    #[serde(default, alias = "endIntent")]
    pub end_intent: Option<bool>,
}

/// Classified outcome of one raw provider call.
///
/// Every raw result is classified exactly once before reconciliation;
/// downstream code matches on this and never re-inspects the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome {
    /// The payload parsed as a [`StructuredReply`] object.
    Structured(StructuredReply),
    /// The payload was non-empty text that did not parse as structured data.
    Unstructured(String),
    /// The provider answered with an error.
    Error { status: Option<u16>, message: String },
    /// The call never produced a provider answer (timeout, panic guard,
    /// cancelled future).
    Aborted { message: String },
}

/// Which path the reconciliation engine took to produce a reply.
///
/// Logged for observability on every reconciliation; never shown to the
/// end user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// Provider output used as-is (possibly with a question appended).
    ProviderSuccess,
    /// Provider repeated an already-asked question; fallback substituted.
    FallbackGuard,
    /// Provider text was usable but not structured.
    UnstructuredResponse,
    /// Provider produced nothing usable; deterministic fallback used.
    EmptyResponse,
    /// Provider returned an error; deterministic fallback used.
    ProviderError,
    /// The call aborted before the provider answered.
    Exception,
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReasonCode::ProviderSuccess => write!(f, "provider_success"),
            ReasonCode::FallbackGuard => write!(f, "fallback_guard"),
            ReasonCode::UnstructuredResponse => write!(f, "unstructured_response"),
            ReasonCode::EmptyResponse => write!(f, "empty_response"),
            ReasonCode::ProviderError => write!(f, "provider_error"),
            ReasonCode::Exception => write!(f, "exception"),
        }
    }
}

/// Final reply contract for one ask request.
///
/// `reply` is always non-empty; `transcript` may be empty when the
/// provider supplied none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciledReply {
    pub reply: String,
    pub transcript: String,
    pub end_intent: bool,
    pub reason: ReasonCode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_reply_accepts_camel_case_end_intent() {
        let parsed: StructuredReply =
            serde_json::from_str(r#"{"reply":"Hi","endIntent":true}"#).unwrap();
        assert_eq!(parsed.end_intent, Some(true));
    }

    #[test]
    fn test_structured_reply_accepts_snake_case_end_intent() {
        let parsed: StructuredReply =
            serde_json::from_str(r#"{"reply":"Hi","end_intent":false}"#).unwrap();
        assert_eq!(parsed.end_intent, Some(false));
    }

    #[test]
    fn test_structured_reply_all_fields_optional() {
        let parsed: StructuredReply = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, StructuredReply::default());
    }

    #[test]
    fn test_reason_code_display_matches_serde() {
        for code in [
            ReasonCode::ProviderSuccess,
            ReasonCode::FallbackGuard,
            ReasonCode::UnstructuredResponse,
            ReasonCode::EmptyResponse,
            ReasonCode::ProviderError,
            ReasonCode::Exception,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{code}\""));
        }
    }

    #[test]
    fn test_provider_error_status() {
        let err = ProviderError::Status {
            status: 503,
            message: "upstream overloaded".to_string(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(ProviderError::RateLimited { retry_after_ms: None }.status(), Some(429));
        assert_eq!(ProviderError::Transport("dns".to_string()).status(), None);
    }

    #[test]
    fn test_completion_request_skips_absent_options() {
        let request = CompletionRequest {
            model: "pico-2".to_string(),
            messages: vec![Message {
                role: TurnRole::User,
                content: "Hello".to_string(),
            }],
            system: None,
            max_tokens: 512,
            temperature: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("system"));
        assert!(!json.contains("temperature"));
    }
}
