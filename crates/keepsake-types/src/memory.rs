//! Memory types for Keepsake.
//!
//! These types model what the engine remembers about one interviewee:
//! highlight details pulled from their turns, the stage taxonomy used to
//! organize them, and the compiled per-handle memory primer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handle::Handle;

/// A short fact extracted from a single user turn.
///
/// Every detail is attributable to exactly one session and one turn;
/// `said_at` is the turn's timestamp and drives newest-first ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightDetail {
    pub text: String,
    pub session_id: Uuid,
    pub said_at: DateTime<Utc>,
}

/// One stage of an interview taxonomy (e.g. "Childhood", "Career").
///
/// Details are classified into the first stage whose keyword list matches;
/// a stage with an empty keyword list acts as the catch-all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewStage {
    /// Section heading used in the rendered primer.
    pub name: String,
    /// Lowercase keywords matched case-insensitively against detail text.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl InterviewStage {
    pub fn new(name: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

/// Ordered list of interview stages used by the primer compiler.
///
/// Order matters twice: classification tries stages first-to-last, and the
/// rendered primer lists sections in taxonomy order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageTaxonomy(pub Vec<InterviewStage>);

impl StageTaxonomy {
    pub fn stages(&self) -> &[InterviewStage] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for StageTaxonomy {
    /// The stock life-story taxonomy: childhood, family, career, and a
    /// catch-all for everything else.
    fn default() -> Self {
        StageTaxonomy(vec![
            InterviewStage::new(
                "Childhood",
                &[
                    "childhood", "grew up", "growing up", "school", "as a child", "young",
                    "when i was little", "parents",
                ],
            ),
            InterviewStage::new(
                "Family & Relationships",
                &[
                    "family", "mother", "father", "brother", "sister", "married", "wife",
                    "husband", "children", "son", "daughter", "friend",
                ],
            ),
            InterviewStage::new(
                "Work & Career",
                &["work", "job", "career", "factory", "office", "business", "retired"],
            ),
            InterviewStage::new("Other Memories", &[]),
        ])
    }
}

/// The compiled memory document for one interviewee.
///
/// One primer exists per handle. It is rebuilt wholesale on every session
/// finalize and treated as a cache: always re-derivable from the handle's
/// full session history, so losing it costs context quality, not
/// correctness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryPrimer {
    pub handle: Handle,
    pub markdown: String,
    pub updated_at: DateTime<Utc>,
}

/// Per-request prompt material assembled from memory state.
///
/// Constructed fresh for each ask request from sessions plus the stored
/// primer; it has no independent lifecycle. The text blocks are intended
/// for direct inclusion in a generative-provider prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryPrompt {
    /// Compiled primer markdown, or empty when no primer exists yet.
    pub primer: String,
    /// Prose recap of prior sessions for this handle.
    pub history: String,
    /// Questions the assistant must not ask again, one per line.
    pub avoid_questions: String,
    /// Transcript block of the most recent turns in the current session.
    pub recent_conversation: String,
    /// The single freshest detail the interviewee shared, if any.
    pub highlight_detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_keywords_lowercased() {
        let stage = InterviewStage::new("Childhood", &["School", "GREW UP"]);
        assert_eq!(stage.keywords, vec!["school", "grew up"]);
    }

    #[test]
    fn test_default_taxonomy_ends_with_catch_all() {
        let taxonomy = StageTaxonomy::default();
        let last = taxonomy.stages().last().unwrap();
        assert!(last.keywords.is_empty());
    }

    #[test]
    fn test_taxonomy_serde_transparent() {
        let taxonomy = StageTaxonomy(vec![InterviewStage::new("Career", &["work"])]);
        let json = serde_json::to_string(&taxonomy).unwrap();
        assert!(json.starts_with('['));
        let parsed: StageTaxonomy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, taxonomy);
    }

    #[test]
    fn test_highlight_detail_serde_roundtrip() {
        let detail = HighlightDetail {
            text: "She grew up on a farm".to_string(),
            session_id: Uuid::now_v7(),
            said_at: Utc::now(),
        };
        let json = serde_json::to_string(&detail).unwrap();
        let parsed: HighlightDetail = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, detail);
    }
}
