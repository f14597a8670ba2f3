//! Engine configuration types for Keepsake.
//!
//! `EngineConfig` holds the knobs of the continuity engine: fallback
//! question templates, the stage taxonomy, and prompt-size limits. All
//! fields have documented defaults so an empty config file works.

use serde::{Deserialize, Serialize};

use crate::memory::StageTaxonomy;

/// Tunable settings for the continuity engine.
///
/// Loaded from the `[engine]` table of `config.toml`; every field falls
/// back to the defaults below when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ordered fallback questions, tried first-to-last. A template may
    /// contain `{detail}`, which is filled with the freshest highlight
    /// detail; templates with an unfilled `{detail}` are skipped.
    #[serde(default = "default_question_templates")]
    pub question_templates: Vec<String>,

    /// Interview stages used to organize the memory primer.
    #[serde(default)]
    pub stage_taxonomy: StageTaxonomy,

    /// Minimum character length for a sentence to count as a detail.
    #[serde(default = "default_min_detail_len")]
    pub min_detail_len: usize,

    /// Cap on the avoided-questions list in a prompt. Excess questions
    /// are dropped silently, oldest first.
    #[serde(default = "default_max_avoided_questions")]
    pub max_avoided_questions: usize,
}

/// Settings for the outbound generative provider call.
///
/// Loaded from the `[provider]` table of `config.toml`. The API key is
/// never part of this struct; it travels separately as a secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Model identifier sent with every completion request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound on generated tokens per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature; omitted from the request when `None`.
    #[serde(default = "default_temperature")]
    pub temperature: Option<f64>,

    /// Seconds to wait on a completion call before treating it as aborted.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> Option<f64> {
    Some(0.7)
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_question_templates() -> Vec<String> {
    [
        "What would you like to talk about today?",
        "Can you tell me more about that?",
        "What else do you remember about {detail}?",
        "How did that make you feel at the time?",
        "Who else was part of that memory?",
        "What happened next?",
        "Is there a story from that time you have never told anyone?",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_min_detail_len() -> usize {
    20
}

fn default_max_avoided_questions() -> usize {
    40
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            question_templates: default_question_templates(),
            stage_taxonomy: StageTaxonomy::default(),
            min_detail_len: default_min_detail_len(),
            max_avoided_questions: default_max_avoided_questions(),
        }
    }
}
