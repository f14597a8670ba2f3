//! Question normalization, extraction, and fallback selection.
//!
//! Everything that decides whether two questions are "the same" lives
//! here: the normalizer that produces comparison keys, the interrogative
//! sentence scanner, and the fallback picker that is guaranteed never to
//! repeat an already-asked question.

use std::collections::HashSet;

use keepsake_types::session::{SessionWithTurns, TurnRole};

/// First words that mark a sentence as interrogative even without a
/// trailing question mark.
const QUESTION_LEAD_WORDS: &[&str] = &[
    "what", "who", "whom", "whose", "where", "when", "why", "how", "which", "did", "do", "does",
    "will", "would", "could", "can", "shall", "should", "is", "are", "was", "were", "am", "have",
    "has", "had",
];

/// Base of the synthetic fallback question used once every configured
/// template has been asked. Uniqueness comes from the appended part
/// number, which is varied until an unasked key is found.
const SYNTHETIC_FALLBACK: &str = "Is there another memory, even a small one, you'd like to share?";

/// Canonicalize a question into its comparison key.
///
/// Lowercases, trims, drops punctuation, and collapses internal
/// whitespace, so strings that differ only in case, a trailing `?`, or
/// spacing normalize identically. Empty or all-punctuation input yields
/// an empty key. Total function; never fails.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut key = String::with_capacity(lowered.len());
    let mut pending_space = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            if !key.is_empty() {
                pending_space = true;
            }
        } else if ch.is_alphanumeric() {
            if pending_space {
                key.push(' ');
                pending_space = false;
            }
            key.push(ch);
        }
    }
    key
}

/// Split free text into trimmed sentences.
///
/// A sentence ends at `.`, `!`, `?` (runs of terminators stay attached
/// to their sentence) or at a line break. Empty fragments are dropped.
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut in_terminator = false;
    for (idx, ch) in text.char_indices() {
        let is_terminator = matches!(ch, '.' | '!' | '?');
        if is_terminator {
            in_terminator = true;
            continue;
        }
        if in_terminator || ch == '\n' {
            let sentence = text[start..idx].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = idx;
            if ch == '\n' {
                start = idx + ch.len_utf8();
            }
            in_terminator = false;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Whether a single sentence reads as a question.
///
/// True when the sentence ends with `?` or begins with a recognized
/// question lead word. A question phrased without either (e.g. "Tell me
/// about the farm.") is missed; that false negative is an accepted
/// limitation of the classifier.
pub fn is_question(sentence: &str) -> bool {
    let trimmed = sentence.trim();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.ends_with('?') {
        return true;
    }
    let first_word = normalize(trimmed);
    let first_word = first_word.split_whitespace().next().unwrap_or("");
    QUESTION_LEAD_WORDS.contains(&first_word)
}

/// Scan free text for interrogative sentences, in reading order.
///
/// Returned strings keep their original casing and punctuation; they are
/// only normalized internally when compared.
pub fn extract_questions(text: &str) -> Vec<String> {
    split_sentences(text)
        .into_iter()
        .filter(|s| is_question(s))
        .map(str::to_string)
        .collect()
}

/// The last interrogative sentence in a block of text, if any.
pub fn last_question(text: &str) -> Option<String> {
    split_sentences(text)
        .into_iter()
        .rev()
        .find(|s| is_question(s))
        .map(str::to_string)
}

/// Collect every question asked by the assistant across the given
/// sessions, in session order then turn order. Not deduplicated; use
/// [`dedup_questions`] for display or avoidance lists.
pub fn collect_asked_questions(sessions: &[SessionWithTurns]) -> Vec<String> {
    let mut questions = Vec::new();
    for session in sessions {
        for turn in session.turns_with_role(TurnRole::Assistant) {
            questions.extend(extract_questions(&turn.text));
        }
    }
    questions
}

/// Drop questions whose normalized key was already seen, keeping the
/// first occurrence in reading order. Questions that normalize to an
/// empty key are dropped outright.
pub fn dedup_questions(questions: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut deduped = Vec::new();
    for question in questions {
        let key = normalize(question);
        if key.is_empty() {
            continue;
        }
        if seen.insert(key) {
            deduped.push(question.clone());
        }
    }
    deduped
}

/// Pick a fallback question guaranteed not to repeat anything in `asked`.
///
/// Templates are tried first-to-last; a template containing `{detail}`
/// is filled with the highlight detail or skipped when none is
/// available. If every template has been asked, a synthetic
/// part-numbered question is generated, varying the number until its key
/// is unasked. Never fails and never returns an empty string.
pub fn pick_fallback_question(
    asked: &[String],
    detail: Option<&str>,
    templates: &[String],
) -> String {
    let asked_keys: HashSet<String> = asked
        .iter()
        .map(|q| normalize(q))
        .filter(|k| !k.is_empty())
        .collect();

    for template in templates {
        let candidate = if template.contains("{detail}") {
            match detail {
                Some(d) => template.replace("{detail}", detail_fragment(d).as_str()),
                None => continue,
            }
        } else {
            template.clone()
        };
        let key = normalize(&candidate);
        if !key.is_empty() && !asked_keys.contains(&key) {
            return candidate;
        }
    }

    if !asked_keys.contains(&normalize(SYNTHETIC_FALLBACK)) {
        return SYNTHETIC_FALLBACK.to_string();
    }
    let mut attempt: u32 = 2;
    loop {
        let candidate = format!(
            "{} (part {attempt})",
            SYNTHETIC_FALLBACK.trim_end_matches('?')
        );
        if !asked_keys.contains(&normalize(&candidate)) {
            return format!("{candidate}?");
        }
        attempt += 1;
    }
}

/// Shape a highlight detail for insertion mid-sentence: trimmed, with
/// trailing sentence punctuation removed.
fn detail_fragment(detail: &str) -> String {
    detail
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use keepsake_types::handle::Handle;
    use keepsake_types::session::{InterviewSession, SessionStatus, Turn};
    use uuid::Uuid;

    fn session_with_turns(turns: Vec<(TurnRole, &str)>) -> SessionWithTurns {
        let session_id = Uuid::now_v7();
        SessionWithTurns {
            session: InterviewSession {
                id: session_id,
                handle: Handle::unassigned(),
                title: None,
                created_at: Utc::now(),
                status: SessionStatus::Active,
                turn_count: turns.len() as u32,
            },
            turns: turns
                .into_iter()
                .map(|(role, text)| Turn {
                    id: Uuid::now_v7(),
                    session_id,
                    role,
                    text: text.to_string(),
                    audio_ref: None,
                    created_at: Utc::now(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_normalize_formatting_insensitive() {
        assert_eq!(
            normalize("What was your favorite toy?"),
            normalize("what was your favorite toy")
        );
        assert_eq!(
            normalize("  What   was your FAVORITE toy??  "),
            "what was your favorite toy"
        );
    }

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("What's your name?"), "whats your name");
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   ?!  "), "");
    }

    #[test]
    fn test_extract_questions_reading_order() {
        let text = "I loved hearing that. What was the farm like? It sounds special. Who lived there with you?";
        let questions = extract_questions(text);
        assert_eq!(
            questions,
            vec!["What was the farm like?", "Who lived there with you?"]
        );
    }

    #[test]
    fn test_extract_questions_keeps_original_casing() {
        let questions = extract_questions("WHAT was THAT like?");
        assert_eq!(questions, vec!["WHAT was THAT like?"]);
    }

    #[test]
    fn test_extract_questions_lead_word_without_mark() {
        let questions = extract_questions("That sounds hard. What did you do next. I'm listening.");
        assert_eq!(questions, vec!["What did you do next."]);
    }

    #[test]
    fn test_extract_questions_misses_unmarked_imperative() {
        // Known classifier limitation: no "?" and no lead word.
        let questions = extract_questions("Tell me about the farm.");
        assert!(questions.is_empty());
    }

    #[test]
    fn test_last_question_picks_final_interrogative() {
        let text = "What was it like? It matters. Who was there?";
        assert_eq!(last_question(text), Some("Who was there?".to_string()));
        assert_eq!(last_question("Nothing to ask here."), None);
    }

    #[test]
    fn test_collect_asked_questions_assistant_turns_only() {
        let sessions = vec![
            session_with_turns(vec![
                (TurnRole::Assistant, "Welcome. What was your first job?"),
                (TurnRole::User, "Why does it matter? I worked at a mill."),
            ]),
            session_with_turns(vec![(
                TurnRole::Assistant,
                "Good to see you. Who taught you to cook?",
            )]),
        ];
        let asked = collect_asked_questions(&sessions);
        assert_eq!(
            asked,
            vec!["What was your first job?", "Who taught you to cook?"]
        );
    }

    #[test]
    fn test_dedup_questions_first_occurrence_wins() {
        let questions = vec![
            "What was your first job?".to_string(),
            "what was your first job".to_string(),
            "Who was there?".to_string(),
        ];
        let deduped = dedup_questions(&questions);
        assert_eq!(deduped, vec!["What was your first job?", "Who was there?"]);
    }

    #[test]
    fn test_pick_fallback_skips_asked_templates() {
        let templates = vec![
            "What would you like to talk about today?".to_string(),
            "What happened next?".to_string(),
        ];
        let asked = vec!["what would you like to talk about today".to_string()];
        let picked = pick_fallback_question(&asked, None, &templates);
        assert_eq!(picked, "What happened next?");
    }

    #[test]
    fn test_pick_fallback_fills_detail_template() {
        let templates = vec!["What else do you remember about {detail}?".to_string()];
        let picked =
            pick_fallback_question(&[], Some("I grew up on a farm."), &templates);
        assert_eq!(picked, "What else do you remember about I grew up on a farm?");
    }

    #[test]
    fn test_pick_fallback_skips_detail_template_without_detail() {
        let templates = vec![
            "What else do you remember about {detail}?".to_string(),
            "What happened next?".to_string(),
        ];
        let picked = pick_fallback_question(&[], None, &templates);
        assert_eq!(picked, "What happened next?");
    }

    #[test]
    fn test_pick_fallback_synthetic_when_templates_exhausted() {
        let templates = vec!["What happened next?".to_string()];
        let asked = vec!["What happened next?".to_string()];
        let picked = pick_fallback_question(&asked, None, &templates);
        assert_eq!(picked, SYNTHETIC_FALLBACK);
    }

    #[test]
    fn test_pick_fallback_never_repeats() {
        let templates = vec![
            "What would you like to talk about today?".to_string(),
            "What happened next?".to_string(),
        ];
        // Exhaust the templates, the synthetic base, and several numbered
        // variants; the picker must still find an unasked question.
        let mut asked: Vec<String> = templates.clone();
        asked.push(SYNTHETIC_FALLBACK.to_string());
        for n in 2..=10 {
            asked.push(format!(
                "{} (part {n})?",
                SYNTHETIC_FALLBACK.trim_end_matches('?')
            ));
        }
        let picked = pick_fallback_question(&asked, None, &templates);
        let picked_key = normalize(&picked);
        assert!(!picked_key.is_empty());
        assert!(asked.iter().all(|q| normalize(q) != picked_key));
    }
}
