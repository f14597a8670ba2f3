//! Generative provider port for Keepsake.
//!
//! `GenerativeProvider` is the trait the infrastructure layer implements
//! for the outbound completion call; `BoxGenerativeProvider` is its
//! object-safe wrapper for runtime provider selection.

pub mod boxed;
pub mod generative;
