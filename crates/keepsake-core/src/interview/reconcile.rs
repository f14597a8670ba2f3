//! Reconciliation of raw provider output against memory state.
//!
//! This is the last gate before the user hears anything: it classifies
//! the raw provider result into a [`ProviderOutcome`], enforces the
//! no-repeat-question invariant, decides the end-of-session flag, and
//! guarantees a non-empty reply. Every path resolves to a reply; provider
//! failures degrade to the precomputed deterministic fallback instead of
//! surfacing an error.

use std::collections::HashSet;

use tracing::{info, warn};

use keepsake_types::provider::{
    ProviderError, ProviderOutcome, ReasonCode, ReconciledReply, StructuredReply,
};

use super::intent::CompletionIntentDetector;
use super::questions::{last_question, normalize};

/// Precomputed material the engine reconciles against.
///
/// `fallback_question` must already be guaranteed unasked (the template
/// picker's contract) and `fallback_reply` non-empty (the composer's).
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInput<'a> {
    /// Raw asked-question list across all sessions (not deduplicated).
    pub asked_questions: &'a [String],
    /// Non-repeating question from the template picker.
    pub fallback_question: &'a str,
    /// Full deterministic fallback reply from the composer.
    pub fallback_reply: &'a str,
    /// Softened form of `fallback_question`, used when the provider
    /// replied without asking anything.
    pub fallback_suggestion: &'a str,
    /// The user's current utterance; end-intent source of last resort.
    pub user_text: &'a str,
}

/// Classify one raw provider call result into an outcome.
///
/// A successful payload is tried as structured data first (tolerating
/// code fences and surrounding prose); anything unparseable stays
/// [`ProviderOutcome::Unstructured`]. Errors map onto
/// [`ProviderOutcome::Error`] with their HTTP status when one exists.
/// Timeouts and panics never reach this function; callers construct
/// [`ProviderOutcome::Aborted`] for those directly.
pub fn classify_outcome(result: Result<String, ProviderError>) -> ProviderOutcome {
    match result {
        Ok(raw) => match parse_structured(&raw) {
            Some(reply) => ProviderOutcome::Structured(reply),
            None => ProviderOutcome::Unstructured(raw),
        },
        Err(err) => ProviderOutcome::Error {
            status: err.status(),
            message: err.to_string(),
        },
    }
}

/// Try to parse provider text as a [`StructuredReply`].
///
/// Two attempts: the payload as-is (after stripping code fences), then
/// the substring between the first `{` and the last `}`. The second
/// attempt is a best-effort heuristic: reply text that itself contains
/// braces can make it extract garbage, which then fails to parse and the
/// payload is treated as unstructured.
pub fn parse_structured(raw: &str) -> Option<StructuredReply> {
    let candidate = strip_code_fences(raw);
    if let Ok(parsed) = serde_json::from_str::<StructuredReply>(candidate) {
        return Some(parsed);
    }
    let first = candidate.find('{')?;
    let last = candidate.rfind('}')?;
    if last <= first {
        return None;
    }
    serde_json::from_str::<StructuredReply>(&candidate[first..=last]).ok()
}

/// Drop a leading ```` ``` ```` (or ```` ```json ````) fence line and a
/// trailing closing fence, if present.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let body = match trimmed.find('\n') {
        Some(line_end) => trimmed[line_end + 1..].trim_end(),
        None => return trimmed,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn is_asked(asked_keys: &HashSet<String>, text: &str) -> bool {
    let key = normalize(text);
    !key.is_empty() && asked_keys.contains(&key)
}

/// Merge a provider outcome with memory constraints into the final reply.
///
/// Output contract: `reply` is never empty, `transcript` may be,
/// `end_intent` is the OR of the provider's flag and the phrase
/// detector, and `reason` names the path taken.
pub fn reconcile(
    outcome: ProviderOutcome,
    input: &ReconcileInput<'_>,
    detector: &dyn CompletionIntentDetector,
) -> ReconciledReply {
    let asked_keys: HashSet<String> = input
        .asked_questions
        .iter()
        .map(|q| normalize(q))
        .filter(|k| !k.is_empty())
        .collect();

    let reconciled = match outcome {
        ProviderOutcome::Structured(reply) => {
            reconcile_structured(reply, input, &asked_keys, detector)
        }
        ProviderOutcome::Unstructured(text) => {
            reconcile_unstructured(&text, input, &asked_keys, detector)
        }
        ProviderOutcome::Error { status, message } => {
            warn!(status = ?status, message = %message, "provider call failed; using deterministic fallback");
            ReconciledReply {
                reply: input.fallback_reply.to_string(),
                transcript: String::new(),
                end_intent: false,
                reason: ReasonCode::ProviderError,
            }
        }
        ProviderOutcome::Aborted { message } => {
            warn!(message = %message, "provider call aborted; using deterministic fallback");
            ReconciledReply {
                reply: input.fallback_reply.to_string(),
                transcript: String::new(),
                end_intent: false,
                reason: ReasonCode::Exception,
            }
        }
    };

    info!(
        reason = %reconciled.reason,
        end_intent = reconciled.end_intent,
        "reconciled provider output"
    );
    reconciled
}

fn reconcile_structured(
    parsed: StructuredReply,
    input: &ReconcileInput<'_>,
    asked_keys: &HashSet<String>,
    detector: &dyn CompletionIntentDetector,
) -> ReconciledReply {
    let reply_base = parsed.reply.as_deref().unwrap_or("").trim().to_string();
    let transcript = parsed.transcript.as_deref().unwrap_or("").trim().to_string();

    let provider_end = parsed.end_intent.unwrap_or(false);
    let intent_text = if transcript.is_empty() {
        input.user_text
    } else {
        transcript.as_str()
    };
    let end_intent = provider_end || detector.should_stop(intent_text);

    // Explicit question field wins; otherwise the last interrogative
    // sentence of the reply text is the candidate.
    let question_field = parsed
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string);
    let candidate_question = question_field.or_else(|| last_question(&reply_base));

    if reply_base.is_empty() && candidate_question.is_none() {
        return ReconciledReply {
            reply: input.fallback_reply.to_string(),
            transcript,
            end_intent,
            reason: ReasonCode::EmptyResponse,
        };
    }

    let mut reason = ReasonCode::ProviderSuccess;
    let mut question = candidate_question;
    if let Some(q) = &question {
        if is_asked(asked_keys, q) {
            question = Some(input.fallback_question.to_string());
            reason = ReasonCode::FallbackGuard;
        }
    }

    let mut reply = match &question {
        Some(q) if reply_base.is_empty() => q.clone(),
        Some(q) if reply_base.contains(q.as_str()) => reply_base.clone(),
        Some(q) => format!("{reply_base} {q}"),
        None => format!("{reply_base} {}", input.fallback_suggestion),
    };

    // The composed reply can still end on a repeated question when the
    // provider buried one in its reply text; force the fallback in.
    if let Some(last) = last_question(&reply) {
        if is_asked(asked_keys, &last) {
            reply = format!("{reply} {}", input.fallback_question);
            reason = ReasonCode::FallbackGuard;
        }
    }

    ReconciledReply {
        reply,
        transcript,
        end_intent,
        reason,
    }
}

fn reconcile_unstructured(
    text: &str,
    input: &ReconcileInput<'_>,
    asked_keys: &HashSet<String>,
    detector: &dyn CompletionIntentDetector,
) -> ReconciledReply {
    let trimmed = text.trim();
    let end_intent = detector.should_stop(input.user_text);

    if trimmed.is_empty() {
        return ReconciledReply {
            reply: input.fallback_reply.to_string(),
            transcript: String::new(),
            end_intent,
            reason: ReasonCode::EmptyResponse,
        };
    }
    if is_asked(asked_keys, trimmed) {
        return ReconciledReply {
            reply: input.fallback_reply.to_string(),
            transcript: String::new(),
            end_intent,
            reason: ReasonCode::FallbackGuard,
        };
    }
    ReconciledReply {
        reply: trimmed.to_string(),
        transcript: String::new(),
        end_intent,
        reason: ReasonCode::UnstructuredResponse,
    }
}
