//! Service layer orchestrating the continuity engine.
//!
//! - `session`: session creation, listing, and reads
//! - `ask`: the per-utterance loop (persist, prompt, provider, reconcile)
//! - `finalize`: session completion and memory primer rebuilds

pub mod ask;
pub mod finalize;
pub mod session;
