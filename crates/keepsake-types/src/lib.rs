//! Shared domain types for Keepsake.
//!
//! This crate contains the core domain types used across the Keepsake
//! platform: interview sessions and turns, interviewee handles, memory
//! primers, provider payloads, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod handle;
pub mod memory;
pub mod provider;
pub mod session;
