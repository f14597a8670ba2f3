//! Memory primer compilation.
//!
//! The primer is a per-handle markdown document recapping everything the
//! interviewee has shared so far, organized by interview stage. It is
//! rebuilt wholesale from the handle's full session history on every
//! finalize rather than patched incrementally, so a rebuild can never
//! drift from the source sessions.

use keepsake_types::handle::Handle;
use keepsake_types::memory::{HighlightDetail, InterviewStage, StageTaxonomy};
use keepsake_types::session::SessionWithTurns;

use crate::interview::details::session_highlights;

/// Classify a detail into the stage it belongs to.
///
/// Tries stages in taxonomy order and picks the first one with a
/// case-insensitive keyword hit. With no hit, falls back to the first
/// stage with an empty keyword list, then to the last stage. Returns
/// `None` only for an empty taxonomy.
pub fn classify_stage<'a>(taxonomy: &'a StageTaxonomy, text: &str) -> Option<&'a InterviewStage> {
    stage_index(taxonomy, text).map(|i| &taxonomy.stages()[i])
}

fn stage_index(taxonomy: &StageTaxonomy, text: &str) -> Option<usize> {
    let stages = taxonomy.stages();
    if stages.is_empty() {
        return None;
    }
    let lowered = text.to_lowercase();
    for (i, stage) in stages.iter().enumerate() {
        if stage.keywords.iter().any(|k| lowered.contains(k.as_str())) {
            return Some(i);
        }
    }
    for (i, stage) in stages.iter().enumerate() {
        if stage.keywords.is_empty() {
            return Some(i);
        }
    }
    Some(stages.len() - 1)
}

/// Compile the memory primer markdown for one handle.
///
/// Pure function of its inputs: identical sessions and taxonomy always
/// render byte-identical markdown, regardless of the order sessions were
/// fetched in. Sessions without any turns are skipped. Never fails;
/// absent data just yields a shorter document.
#[tracing::instrument(
    name = "compile_primer",
    skip(sessions, taxonomy),
    fields(handle = %handle, session_count = sessions.len())
)]
pub fn compile_primer(
    handle: &Handle,
    sessions: &[SessionWithTurns],
    taxonomy: &StageTaxonomy,
    min_len: usize,
) -> String {
    let mut ordered: Vec<&SessionWithTurns> = sessions
        .iter()
        .filter(|s| !s.turns.is_empty())
        .collect();
    ordered.sort_by(|a, b| {
        (a.session.created_at, a.session.id).cmp(&(b.session.created_at, b.session.id))
    });

    let stages = taxonomy.stages();
    let mut grouped: Vec<Vec<HighlightDetail>> = vec![Vec::new(); stages.len()];
    for session in &ordered {
        for detail in session_highlights(session, min_len) {
            if let Some(i) = stage_index(taxonomy, &detail.text) {
                grouped[i].push(detail);
            }
        }
    }
    for details in &mut grouped {
        details.sort_by(|a, b| b.said_at.cmp(&a.said_at));
    }

    let mut doc = String::new();
    doc.push_str(&format!("# Memory primer for {handle}\n"));
    doc.push_str(&format!(
        "\nCompiled from {} session{}.\n",
        ordered.len(),
        if ordered.len() == 1 { "" } else { "s" }
    ));

    let mut any = false;
    for (stage, details) in stages.iter().zip(&grouped) {
        if details.is_empty() {
            continue;
        }
        any = true;
        doc.push_str(&format!("\n## {}\n\n", stage.name));
        for (i, detail) in details.iter().enumerate() {
            if i == 0 {
                doc.push_str(&format!("- (Latest) {}\n", detail.text));
            } else {
                doc.push_str(&format!("- {}\n", detail.text));
            }
        }
    }
    if !any {
        doc.push_str("\nNothing recorded yet.\n");
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use keepsake_types::session::{InterviewSession, SessionStatus, Turn, TurnRole};
    use uuid::Uuid;

    fn session_at(age_hours: i64, turns: Vec<(TurnRole, &str)>) -> SessionWithTurns {
        let session_id = Uuid::now_v7();
        let created_at = Utc::now() - Duration::hours(age_hours);
        SessionWithTurns {
            session: InterviewSession {
                id: session_id,
                handle: Handle::normalize(Some("margaret")),
                title: None,
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

    #[test]
    fn test_classify_picks_first_keyword_hit() {
        let taxonomy = StageTaxonomy::default();
        let stage = classify_stage(&taxonomy, "I loved my school years in the village").unwrap();
        assert_eq!(stage.name, "Childhood");
    }

    #[test]
    fn test_classify_unmatched_goes_to_catch_all() {
        let taxonomy = StageTaxonomy::default();
        let stage = classify_stage(&taxonomy, "The sea was calm that morning").unwrap();
        assert_eq!(stage.name, "Other Memories");
    }

    #[test]
    fn test_classify_without_catch_all_uses_last_stage() {
        let taxonomy = StageTaxonomy(vec![
            InterviewStage::new("Travel", &["train", "ship"]),
            InterviewStage::new("Food", &["bread", "soup"]),
        ]);
        let stage = classify_stage(&taxonomy, "Nothing matches this").unwrap();
        assert_eq!(stage.name, "Food");
    }

    #[test]
    fn test_classify_empty_taxonomy() {
        let taxonomy = StageTaxonomy(vec![]);
        assert!(classify_stage(&taxonomy, "anything").is_none());
    }

    #[test]
    fn test_compile_is_idempotent() {
        let handle = Handle::normalize(Some("margaret"));
        let sessions = vec![
            session_at(
                48,
                vec![(TurnRole::User, "I grew up on a farm outside the village.")],
            ),
            session_at(
                2,
                vec![(TurnRole::User, "My first job was at the textile factory.")],
            ),
        ];
        let taxonomy = StageTaxonomy::default();
        let first = compile_primer(&handle, &sessions, &taxonomy, 20);
        let second = compile_primer(&handle, &sessions, &taxonomy, 20);
        assert_eq!(first, second);
    }

    #[test]
    fn test_compile_independent_of_fetch_order() {
        let handle = Handle::normalize(Some("margaret"));
        let a = session_at(
            48,
            vec![(TurnRole::User, "I grew up on a farm outside the village.")],
        );
        let b = session_at(
            2,
            vec![(TurnRole::User, "My first job was at the textile factory.")],
        );
        let taxonomy = StageTaxonomy::default();
        let forward = compile_primer(&handle, &[a.clone(), b.clone()], &taxonomy, 20);
        let reversed = compile_primer(&handle, &[b, a], &taxonomy, 20);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_compile_groups_by_stage_newest_first() {
        let handle = Handle::normalize(Some("margaret"));
        let sessions = vec![
            session_at(
                48,
                vec![(TurnRole::User, "My mother sang while she cooked for the family.")],
            ),
            session_at(
                2,
                vec![(TurnRole::User, "My sister and I still talk every single Sunday.")],
            ),
        ];
        let doc = compile_primer(&handle, &sessions, &StageTaxonomy::default(), 20);
        assert!(doc.contains("## Family & Relationships"));
        let latest = doc.find("- (Latest) My sister and I still talk").unwrap();
        let older = doc.find("- My mother sang while she cooked").unwrap();
        assert!(latest < older);
    }

    #[test]
    fn test_compile_skips_sessions_without_turns() {
        let handle = Handle::normalize(Some("margaret"));
        let empty = session_at(10, vec![]);
        let full = session_at(
            2,
            vec![(TurnRole::User, "I worked at the harbor office for years.")],
        );
        let doc = compile_primer(&handle, &[empty, full], &StageTaxonomy::default(), 20);
        assert!(doc.contains("Compiled from 1 session."));
        assert!(doc.contains("harbor office"));
    }

    #[test]
    fn test_compile_with_no_sessions() {
        let handle = Handle::normalize(Some("margaret"));
        let doc = compile_primer(&handle, &[], &StageTaxonomy::default(), 20);
        assert!(doc.starts_with("# Memory primer for margaret"));
        assert!(doc.contains("Nothing recorded yet."));
    }
}
