//! Deterministic fallback reply composition.
//!
//! When the provider is unavailable, unusable, or repeats itself, the
//! reply the user hears comes from here. The composed text is always
//! non-empty: a greeting or acknowledgement sentence followed by at most
//! one question suggestion.

const FIRST_SESSION_GREETING: &str =
    "Welcome! I'm so glad you're here to record your story. Take your time, and start wherever feels natural.";

const RETURNING_GENERIC: &str =
    "It's wonderful to have you back. I've been looking forward to hearing more of your story.";

/// What the fallback composer knows about the request.
#[derive(Debug, Clone, Copy)]
pub struct FallbackContext<'a> {
    /// Whether any prior session exists for this handle.
    pub has_prior_sessions: bool,
    /// Number of turns already in the current session.
    pub current_turn_count: usize,
    /// Freshest detail from prior sessions, if one exists.
    pub highlight_detail: Option<&'a str>,
    /// Precomputed non-repeating question from the template picker.
    pub fallback_question: &'a str,
}

/// Compose the deterministic fallback reply.
///
/// First contact (no prior sessions, empty current session) gets the
/// greeting; a returning user gets an acknowledgement that names their
/// last shared detail when one is known. The softened fallback question
/// is appended as a suggestion in every case.
pub fn compose_fallback(ctx: &FallbackContext<'_>) -> String {
    let base = if !ctx.has_prior_sessions && ctx.current_turn_count == 0 {
        FIRST_SESSION_GREETING.to_string()
    } else {
        match ctx.highlight_detail {
            Some(detail) if !detail.trim().is_empty() => format!(
                "It's wonderful to have you back. Last time, you shared this memory: \"{}\"",
                detail.trim()
            ),
            _ => RETURNING_GENERIC.to_string(),
        }
    };

    let suggestion = soften_question(ctx.fallback_question);
    format!("{base} {suggestion}")
}

/// Soften a direct question into a suggestion.
///
/// "What was your first job?" becomes
/// "If you'd like, you could share what was your first job?".
/// The trailing question mark is stripped before reinsertion and the
/// first character is lowercased. Total function; blank input still
/// yields a usable suggestion.
pub fn soften_question(question: &str) -> String {
    let core = question.trim().trim_end_matches('?').trim_end();
    if core.is_empty() {
        return "If you'd like, you could share whatever memory comes to mind?".to_string();
    }
    let mut chars = core.chars();
    let lowered = match chars.next() {
        Some(first) => format!("{}{}", first.to_lowercase(), chars.as_str()),
        None => String::new(),
    };
    format!("If you'd like, you could share {lowered}?")
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUESTION: &str = "What was your first job?";

    #[test]
    fn test_first_session_greeting() {
        let reply = compose_fallback(&FallbackContext {
            has_prior_sessions: false,
            current_turn_count: 0,
            highlight_detail: None,
            fallback_question: QUESTION,
        });
        assert!(reply.starts_with("Welcome!"));
        assert!(reply.ends_with("what was your first job?"));
    }

    #[test]
    fn test_returning_with_detail_names_it() {
        let reply = compose_fallback(&FallbackContext {
            has_prior_sessions: true,
            current_turn_count: 0,
            highlight_detail: Some("I grew up on a farm"),
            fallback_question: QUESTION,
        });
        assert!(reply.contains("I grew up on a farm"));
        assert!(reply.contains("If you'd like, you could share"));
    }

    #[test]
    fn test_returning_without_detail_is_generic() {
        let reply = compose_fallback(&FallbackContext {
            has_prior_sessions: true,
            current_turn_count: 3,
            highlight_detail: None,
            fallback_question: QUESTION,
        });
        assert!(reply.starts_with("It's wonderful to have you back."));
        assert!(!reply.contains('"'));
    }

    #[test]
    fn test_current_turns_mean_not_first_contact() {
        // No prior sessions but the current session already has turns:
        // not a first greeting.
        let reply = compose_fallback(&FallbackContext {
            has_prior_sessions: false,
            current_turn_count: 2,
            highlight_detail: None,
            fallback_question: QUESTION,
        });
        assert!(!reply.starts_with("Welcome!"));
    }

    #[test]
    fn test_soften_question_transform() {
        assert_eq!(
            soften_question("What was your first job?"),
            "If you'd like, you could share what was your first job?"
        );
    }

    #[test]
    fn test_soften_question_blank_input() {
        let softened = soften_question("   ");
        assert!(softened.starts_with("If you'd like"));
        assert!(softened.ends_with('?'));
    }

    #[test]
    fn test_compose_always_single_trailing_question() {
        let reply = compose_fallback(&FallbackContext {
            has_prior_sessions: true,
            current_turn_count: 1,
            highlight_detail: Some("My brother and I built a raft"),
            fallback_question: QUESTION,
        });
        assert!(!reply.is_empty());
        assert_eq!(reply.matches('?').count(), 1);
        assert!(reply.ends_with('?'));
    }
}
