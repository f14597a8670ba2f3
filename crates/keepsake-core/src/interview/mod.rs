//! Interview continuity logic for Keepsake.
//!
//! Everything the engine knows about running a long-form spoken interview
//! lives here:
//! - `questions`: normalization, question extraction, and the non-repeating
//!   fallback question picker
//! - `details`: pulling the freshest concrete details out of past sessions
//! - `fallback`: composing a full scripted reply when the provider cannot
//! - `prompt`: assembling the memory prompt and rendering the system prompt
//! - `intent`: phrase-level detection of "I want to stop" from the user
//! - `reconcile`: turning a raw provider outcome into the reply we ship

pub mod details;
pub mod fallback;
pub mod intent;
pub mod prompt;
pub mod questions;
pub mod reconcile;
