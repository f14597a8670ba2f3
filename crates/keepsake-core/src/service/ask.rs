//! Ask service: one user utterance in, one reconciled reply out.
//!
//! This is the engine's main loop body. Each ask persists the user turn,
//! assembles the memory prompt, precomputes the deterministic fallback,
//! makes at most one provider call, reconciles the outcome, and persists
//! the assistant turn. Provider trouble never surfaces as an error: the
//! reply degrades to the fallback and the reason code records why.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use keepsake_types::config::{EngineConfig, ProviderConfig};
use keepsake_types::error::SessionError;
use keepsake_types::provider::{
    CompletionRequest, Message, ProviderError, ProviderOutcome, ReconciledReply,
};
use keepsake_types::session::{SessionStatus, SessionWithTurns, Turn, TurnRole};

use crate::interview::fallback::{FallbackContext, compose_fallback, soften_question};
use crate::interview::intent::PhraseIntentDetector;
use crate::interview::prompt::{InterviewPromptBuilder, build_memory_prompt};
use crate::interview::questions::{collect_asked_questions, pick_fallback_question};
use crate::interview::reconcile::{ReconcileInput, classify_outcome, reconcile};
use crate::memory::cache::SessionCache;
use crate::provider::boxed::BoxGenerativeProvider;
use crate::repository::primer::PrimerRepository;
use crate::repository::session::SessionRepository;

/// Orchestrates the per-utterance ask flow.
///
/// Generic over the repository traits to maintain clean architecture
/// (keepsake-core never depends on keepsake-infra). The provider is
/// optional: with none configured the engine runs in offline mode and
/// every reply takes the deterministic fallback path.
pub struct AskService<S: SessionRepository, P: PrimerRepository> {
    session_repo: S,
    primer_repo: P,
    provider: Option<BoxGenerativeProvider>,
    cache: SessionCache,
    detector: PhraseIntentDetector,
    engine_config: EngineConfig,
    provider_config: ProviderConfig,
}

impl<S: SessionRepository, P: PrimerRepository> AskService<S, P> {
    /// Create a new ask service.
    pub fn new(
        session_repo: S,
        primer_repo: P,
        provider: Option<BoxGenerativeProvider>,
        cache: SessionCache,
        engine_config: EngineConfig,
        provider_config: ProviderConfig,
    ) -> Self {
        Self {
            session_repo,
            primer_repo,
            provider,
            cache,
            detector: PhraseIntentDetector::new(),
            engine_config,
            provider_config,
        }
    }

    /// Process one user utterance and produce the reply the user hears.
    ///
    /// Fails only when the session is missing, already completed, or a
    /// turn cannot be persisted. Context reads (prior sessions, primer)
    /// degrade to less context on failure, and the provider call itself
    /// can only ever degrade the reply to the fallback.
    #[tracing::instrument(
        name = "compose_reply",
        skip(self, user_text, audio_ref),
        fields(session_id = %session_id, text_len = user_text.len())
    )]
    pub async fn ask(
        &self,
        session_id: &Uuid,
        user_text: &str,
        audio_ref: Option<String>,
    ) -> Result<ReconciledReply, SessionError> {
        let mut current = self
            .session_repo
            .get_session_with_turns(session_id)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))?
            .ok_or(SessionError::NotFound)?;
        if current.session.status == SessionStatus::Completed {
            return Err(SessionError::AlreadyCompleted);
        }
        let turns_before_utterance = current.turns.len();

        // The user's words are persisted before anything that can degrade.
        let user_turn = Turn {
            id: Uuid::now_v7(),
            session_id: current.session.id,
            role: TurnRole::User,
            text: user_text.to_string(),
            audio_ref,
            created_at: Utc::now(),
        };
        self.session_repo
            .append_turn(&user_turn)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))?;
        let handle = current.session.handle.clone();
        self.cache.invalidate(&handle);
        current.turns.push(user_turn);
        current.session.turn_count += 1;

        let prior = self.prior_sessions(&current).await;
        let primer = match self.primer_repo.get_primer(&handle).await {
            Ok(primer) => primer,
            Err(err) => {
                warn!(handle = %handle, error = %err, "primer fetch failed; continuing without it");
                None
            }
        };

        let prompt = build_memory_prompt(
            &prior,
            &current,
            primer.as_ref().map(|p| p.markdown.as_str()),
            &self.engine_config,
        );

        // Precompute the deterministic path before touching the provider.
        let mut scanned = prior.clone();
        scanned.push(current.clone());
        let asked = collect_asked_questions(&scanned);
        let fallback_question = pick_fallback_question(
            &asked,
            prompt.highlight_detail.as_deref(),
            &self.engine_config.question_templates,
        );
        let fallback_reply = compose_fallback(&FallbackContext {
            has_prior_sessions: !prior.is_empty(),
            current_turn_count: turns_before_utterance,
            highlight_detail: prompt.highlight_detail.as_deref(),
            fallback_question: &fallback_question,
        });
        let fallback_suggestion = soften_question(&fallback_question);

        let request = CompletionRequest {
            model: self.provider_config.model.clone(),
            messages: vec![Message {
                role: TurnRole::User,
                content: user_text.to_string(),
            }],
            system: Some(InterviewPromptBuilder::build(&prompt)),
            max_tokens: self.provider_config.max_tokens,
            temperature: self.provider_config.temperature,
        };
        let outcome = self.call_provider(&request).await;

        let reconciled = reconcile(
            outcome,
            &ReconcileInput {
                asked_questions: &asked,
                fallback_question: &fallback_question,
                fallback_reply: &fallback_reply,
                fallback_suggestion: &fallback_suggestion,
                user_text,
            },
            &self.detector,
        );

        let assistant_turn = Turn {
            id: Uuid::now_v7(),
            session_id: current.session.id,
            role: TurnRole::Assistant,
            text: reconciled.reply.clone(),
            audio_ref: None,
            created_at: Utc::now(),
        };
        self.session_repo
            .append_turn(&assistant_turn)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))?;
        self.cache.invalidate(&handle);

        info!(
            session_id = %current.session.id,
            reason = %reconciled.reason,
            end_intent = reconciled.end_intent,
            "Reply composed"
        );
        Ok(reconciled)
    }

    /// The handle's other sessions, current excluded. Read failures
    /// degrade to an empty history rather than failing the ask.
    async fn prior_sessions(&self, current: &SessionWithTurns) -> Vec<SessionWithTurns> {
        match self
            .cache
            .hydrate(&current.session.handle, &self.session_repo)
            .await
        {
            Ok(sessions) => sessions
                .iter()
                .filter(|s| s.session.id != current.session.id)
                .cloned()
                .collect(),
            Err(err) => {
                warn!(
                    handle = %current.session.handle,
                    error = %err,
                    "prior session fetch failed; continuing without history"
                );
                Vec::new()
            }
        }
    }

    /// Run the provider call under the configured timeout and classify it.
    async fn call_provider(&self, request: &CompletionRequest) -> ProviderOutcome {
        let provider = match &self.provider {
            Some(provider) => provider,
            None => {
                return ProviderOutcome::Error {
                    status: None,
                    message: ProviderError::NotConfigured.to_string(),
                };
            }
        };
        let timeout = Duration::from_secs(self.provider_config.timeout_secs);
        match tokio::time::timeout(timeout, provider.complete(request)).await {
            Ok(result) => classify_outcome(result.map(|response| response.content)),
            Err(_) => ProviderOutcome::Aborted {
                message: format!(
                    "completion timed out after {}s",
                    self.provider_config.timeout_secs
                ),
            },
        }
    }
}
