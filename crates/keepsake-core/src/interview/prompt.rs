//! Memory prompt assembly for provider calls.
//!
//! Builds the per-request [`MemoryPrompt`] from sessions and the stored
//! primer, then renders it into a system prompt using XML tag boundaries
//! so the provider can distinguish primer, history, avoidance list, and
//! conversation sections.

use keepsake_types::config::EngineConfig;
use keepsake_types::memory::MemoryPrompt;
use keepsake_types::session::{SessionWithTurns, TurnRole};

use super::details::{find_latest_user_details, session_highlights};
use super::questions::{collect_asked_questions, dedup_questions};

/// How many trailing turns of the current session are quoted verbatim.
const RECENT_TURN_WINDOW: usize = 12;

/// Assemble the per-request memory prompt.
///
/// `prior` holds the handle's other sessions (the current one excluded);
/// `current` is the session being extended. The avoided-question list is
/// deduplicated and capped at `max_avoided_questions`, dropping the
/// oldest entries first.
pub fn build_memory_prompt(
    prior: &[SessionWithTurns],
    current: &SessionWithTurns,
    primer: Option<&str>,
    config: &EngineConfig,
) -> MemoryPrompt {
    let mut ordered: Vec<&SessionWithTurns> = prior.iter().collect();
    ordered.sort_by(|a, b| {
        (a.session.created_at, a.session.id).cmp(&(b.session.created_at, b.session.id))
    });

    let mut history_lines = Vec::with_capacity(ordered.len());
    for session in &ordered {
        let label = match &session.session.title {
            Some(title) => title.clone(),
            None => format!("Session on {}", session.session.created_at.format("%Y-%m-%d")),
        };
        match session_highlights(session, config.min_detail_len).last() {
            Some(highlight) => history_lines.push(format!("- {label}: {}", highlight.text)),
            None => history_lines.push(format!("- {label}")),
        }
    }

    let mut scanned: Vec<SessionWithTurns> =
        ordered.iter().map(|s| (*s).clone()).collect();
    scanned.push(current.clone());
    let mut avoided = dedup_questions(&collect_asked_questions(&scanned));
    if avoided.len() > config.max_avoided_questions {
        avoided = avoided.split_off(avoided.len() - config.max_avoided_questions);
    }

    let recent: Vec<String> = current
        .turns
        .iter()
        .rev()
        .take(RECENT_TURN_WINDOW)
        .rev()
        .map(|turn| {
            let speaker = match turn.role {
                TurnRole::User => "User",
                TurnRole::Assistant => "Interviewer",
            };
            format!("{speaker}: {}", turn.text)
        })
        .collect();

    let highlight_detail =
        find_latest_user_details(prior, 1, None, config.min_detail_len)
            .into_iter()
            .next();

    MemoryPrompt {
        primer: primer.unwrap_or("").trim().to_string(),
        history: history_lines.join("\n"),
        avoid_questions: avoided
            .iter()
            .map(|q| format!("- {q}"))
            .collect::<Vec<_>>()
            .join("\n"),
        recent_conversation: recent.join("\n"),
        highlight_detail,
    }
}

/// Renders a [`MemoryPrompt`] into the provider system prompt.
///
/// Layout:
/// ```text
/// <role>You are a warm, patient interviewer...</role>
/// <memory_primer>{compiled primer}</memory_primer>
/// <prior_sessions>{one line per past session}</prior_sessions>
/// <recent_conversation>{last turns of the current session}</recent_conversation>
/// <avoid_questions>Never ask these again: ...</avoid_questions>
/// <instructions>Respond with a single JSON object...</instructions>
/// ```
/// Empty sections are omitted; `<role>` and `<instructions>` are always
/// present.
pub struct InterviewPromptBuilder;

impl InterviewPromptBuilder {
    pub fn build(prompt: &MemoryPrompt) -> String {
        let mut sections = Vec::with_capacity(6);

        // Role section -- the interviewer persona
        sections.push(
            "<role>\n\
            You are a warm, patient interviewer helping someone record their life story \
            out loud, one session at a time. You listen closely, react to what they \
            actually said, and ask one gentle follow-up question at a time.\n\
            </role>"
                .to_string(),
        );

        if !prompt.primer.is_empty() {
            sections.push(format!(
                "<memory_primer>\n{}\n</memory_primer>",
                prompt.primer
            ));
        }

        if !prompt.history.is_empty() {
            sections.push(format!(
                "<prior_sessions>\nWhat they shared in earlier sessions:\n{}\n</prior_sessions>",
                prompt.history
            ));
        }

        if !prompt.recent_conversation.is_empty() {
            sections.push(format!(
                "<recent_conversation>\n{}\n</recent_conversation>",
                prompt.recent_conversation
            ));
        }

        if !prompt.avoid_questions.is_empty() {
            sections.push(format!(
                "<avoid_questions>\n\
                You have already asked these questions. Never ask them again, \
                in any wording:\n{}\n</avoid_questions>",
                prompt.avoid_questions
            ));
        }

        // Instructions section -- the output contract
        sections.push(
            "<instructions>\n\
            Respond with a single JSON object and nothing else:\n\
            {\"reply\": \"what you say back, ending with one new question\", \
            \"transcript\": \"a cleaned-up transcript of what the user just said\", \
            \"question\": \"the one question you asked\", \
            \"endIntent\": false}\n\
            Set endIntent to true only when the user clearly wants to stop the session.\n\
            </instructions>"
                .to_string(),
        );

        sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use keepsake_types::handle::Handle;
    use keepsake_types::session::{InterviewSession, SessionStatus, Turn};
    use uuid::Uuid;

    fn session_at(age_hours: i64, title: Option<&str>, turns: Vec<(TurnRole, &str)>) -> SessionWithTurns {
        let session_id = Uuid::now_v7();
        let created_at = Utc::now() - Duration::hours(age_hours);
        SessionWithTurns {
            session: InterviewSession {
                id: session_id,
                handle: Handle::normalize(Some("margaret")),
                title: title.map(str::to_string),
                created_at,
                status: SessionStatus::Completed,
                turn_count: turns.len() as u32,
            },
            turns: turns
                .into_iter()
                .enumerate()
                .map(|(i, (role, text))| Turn {
                    id: Uuid::now_v7(),
                    session_id,
                    role,
                    text: text.to_string(),
                    audio_ref: None,
                    created_at: created_at + Duration::minutes(i as i64),
                })
                .collect(),
        }
    }

    fn default_config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn test_history_lists_prior_sessions_oldest_first() {
        let prior = vec![
            session_at(
                2,
                Some("The raft summer"),
                vec![(TurnRole::User, "My brother and I built a raft one summer.")],
            ),
            session_at(
                50,
                Some("Village years"),
                vec![(TurnRole::User, "I was born in a small village by the sea.")],
            ),
        ];
        let current = session_at(0, None, vec![]);
        let prompt = build_memory_prompt(&prior, &current, None, &default_config());
        let village = prompt.history.find("Village years").unwrap();
        let raft = prompt.history.find("The raft summer").unwrap();
        assert!(village < raft);
        assert!(prompt.history.contains("I was born in a small village by the sea."));
    }

    #[test]
    fn test_avoided_questions_deduped_and_capped() {
        let mut config = default_config();
        config.max_avoided_questions = 2;
        let prior = vec![session_at(
            10,
            None,
            vec![
                (TurnRole::Assistant, "What was your first job?"),
                (TurnRole::Assistant, "what was your first job"),
                (TurnRole::Assistant, "Who taught you to cook?"),
            ],
        )];
        let current = session_at(
            0,
            None,
            vec![(TurnRole::Assistant, "What happened next?")],
        );
        let prompt = build_memory_prompt(&prior, &current, None, &config);
        // Oldest dropped first: the first-job question falls off the list.
        assert!(!prompt.avoid_questions.contains("first job"));
        assert!(prompt.avoid_questions.contains("Who taught you to cook?"));
        assert!(prompt.avoid_questions.contains("What happened next?"));
    }

    #[test]
    fn test_recent_conversation_windows_current_session() {
        let turns = vec![(TurnRole::User, "filler"); 20];
        let mut current = session_at(0, None, turns);
        current.turns.push(Turn {
            id: Uuid::now_v7(),
            session_id: current.session.id,
            role: TurnRole::Assistant,
            text: "And then what happened?".to_string(),
            audio_ref: None,
            created_at: Utc::now(),
        });
        let prompt = build_memory_prompt(&[], &current, None, &default_config());
        assert_eq!(prompt.recent_conversation.lines().count(), RECENT_TURN_WINDOW);
        assert!(prompt
            .recent_conversation
            .ends_with("Interviewer: And then what happened?"));
    }

    #[test]
    fn test_highlight_detail_comes_from_prior_sessions_only() {
        let prior = vec![session_at(
            10,
            None,
            vec![(TurnRole::User, "I was born in a small village by the sea.")],
        )];
        let current = session_at(
            0,
            None,
            vec![(TurnRole::User, "Today I want to talk about my garden instead.")],
        );
        let prompt = build_memory_prompt(&prior, &current, None, &default_config());
        assert_eq!(
            prompt.highlight_detail.as_deref(),
            Some("I was born in a small village by the sea.")
        );
    }

    #[test]
    fn test_rendered_prompt_sections() {
        let prior = vec![session_at(
            10,
            None,
            vec![
                (TurnRole::User, "I was born in a small village by the sea."),
                (TurnRole::Assistant, "What was the village called?"),
            ],
        )];
        let current = session_at(0, None, vec![(TurnRole::User, "Hello again.")]);
        let prompt =
            build_memory_prompt(&prior, &current, Some("# What I remember"), &default_config());
        let rendered = InterviewPromptBuilder::build(&prompt);

        assert!(rendered.contains("<role>"));
        assert!(rendered.contains("<memory_primer>"));
        assert!(rendered.contains("# What I remember"));
        assert!(rendered.contains("<prior_sessions>"));
        assert!(rendered.contains("<recent_conversation>"));
        assert!(rendered.contains("<avoid_questions>"));
        assert!(rendered.contains("What was the village called?"));
        assert!(rendered.contains("<instructions>"));
        assert!(rendered.contains("endIntent"));
    }

    #[test]
    fn test_rendered_prompt_omits_empty_sections() {
        let current = session_at(0, None, vec![]);
        let prompt = build_memory_prompt(&[], &current, None, &default_config());
        let rendered = InterviewPromptBuilder::build(&prompt);

        assert!(rendered.contains("<role>"));
        assert!(rendered.contains("<instructions>"));
        assert!(!rendered.contains("<memory_primer>"));
        assert!(!rendered.contains("<prior_sessions>"));
        assert!(!rendered.contains("<recent_conversation>"));
        assert!(!rendered.contains("<avoid_questions>"));
    }
}
