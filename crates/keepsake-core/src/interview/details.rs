//! Highlight detail extraction from user turns.
//!
//! A "detail" is the first substantial, non-interrogative sentence of a
//! user turn. Details feed the fallback composer (naming what the
//! interviewee shared last time) and the memory primer compiler.

use tracing::debug;
use uuid::Uuid;

use keepsake_types::memory::HighlightDetail;
use keepsake_types::session::{SessionWithTurns, TurnRole};

use super::questions::{is_question, split_sentences};

/// The first sentence of a turn that qualifies as a detail: at least
/// `min_len` characters and not itself a question. Returns `None` when
/// no sentence qualifies.
pub fn first_meaningful_sentence(text: &str, min_len: usize) -> Option<String> {
    split_sentences(text)
        .into_iter()
        .find(|s| s.chars().count() >= min_len && !is_question(s))
        .map(str::to_string)
}

/// Collect the latest user-shared details across sessions, newest first.
///
/// Sessions are walked from most recently created to oldest (skipping
/// `exclude_session_id` when set); within each session user turns are
/// walked newest first, contributing at most one detail each. Collection
/// stops at `limit`. Missing or unusable data yields a shorter result,
/// never an error.
#[tracing::instrument(
    name = "extract_details",
    skip(sessions),
    fields(session_count = sessions.len())
)]
pub fn find_latest_user_details(
    sessions: &[SessionWithTurns],
    limit: usize,
    exclude_session_id: Option<Uuid>,
    min_len: usize,
) -> Vec<String> {
    if limit == 0 {
        return Vec::new();
    }

    let mut ordered: Vec<&SessionWithTurns> = sessions
        .iter()
        .filter(|s| exclude_session_id.map_or(true, |id| s.session.id != id))
        .collect();
    ordered.sort_by(|a, b| {
        (b.session.created_at, b.session.id).cmp(&(a.session.created_at, a.session.id))
    });

    let mut details = Vec::new();
    for session in ordered {
        for turn in session.turns.iter().rev() {
            if turn.role != TurnRole::User {
                continue;
            }
            if let Some(sentence) = first_meaningful_sentence(&turn.text, min_len) {
                details.push(sentence);
                if details.len() == limit {
                    return details;
                }
            }
        }
    }
    details
}

/// All attributed details in one session, in turn order.
///
/// Each qualifying user turn contributes exactly one [`HighlightDetail`]
/// carrying the source session id and the turn's timestamp.
pub fn session_highlights(session: &SessionWithTurns, min_len: usize) -> Vec<HighlightDetail> {
    let mut highlights = Vec::new();
    for turn in session.turns_with_role(TurnRole::User) {
        match first_meaningful_sentence(&turn.text, min_len) {
            Some(text) => highlights.push(HighlightDetail {
                text,
                session_id: session.session.id,
                said_at: turn.created_at,
            }),
            None => {
                debug!(turn_id = %turn.id, "turn has no qualifying detail sentence");
            }
        }
    }
    highlights
}
