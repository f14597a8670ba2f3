//! End-of-session intent detection.
//!
//! The interviewee can end a session by saying so; this module decides
//! whether a stretch of text expresses that intent. The reconciliation
//! engine ORs this signal with the provider's own end flag.

/// Decides whether text expresses the intent to stop the session.
///
/// Implementations must be infallible: uncertain input means "keep
/// going", never an error.
pub trait CompletionIntentDetector: Send + Sync {
    fn should_stop(&self, text: &str) -> bool;
}

/// Stop phrases matched case-insensitively, with common apostrophe
/// spellings listed separately.
const STOP_PHRASES: &[&str] = &[
    "i'm done",
    "im done",
    "i am done",
    "i'm finished",
    "i am finished",
    "we're done",
    "we are done",
    "let's stop",
    "lets stop",
    "let's finish",
    "lets finish",
    "that's all for today",
    "thats all for today",
    "that's enough for now",
    "thats enough for now",
    "stop the interview",
    "stop recording",
    "end the session",
    "i'd like to stop",
    "i want to stop",
];

/// Phrase-list detector over lowercase containment.
///
/// All phrases are multi-word, so containment does not misfire on
/// substrings of single words ("done" inside "wondered"). A stop phrase
/// embedded in an unrelated sentence still matches; that coarseness is
/// accepted.
pub struct PhraseIntentDetector {
    phrases: Vec<String>,
}

impl PhraseIntentDetector {
    pub fn new() -> Self {
        Self {
            phrases: STOP_PHRASES.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Detector with a custom phrase list; phrases are lowercased.
    pub fn with_phrases(phrases: Vec<String>) -> Self {
        Self {
            phrases: phrases.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }
}

impl Default for PhraseIntentDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionIntentDetector for PhraseIntentDetector {
    fn should_stop(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let lowered = text.to_lowercase();
        self.phrases.iter().any(|p| lowered.contains(p.as_str()))
    }
}
