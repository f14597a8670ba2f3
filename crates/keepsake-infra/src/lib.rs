//! Infrastructure layer for Keepsake.
//!
//! Contains implementations of the ports defined in `keepsake-core`:
//! SQLite storage behind the repository traits, the HTTP generative
//! provider, and the file-based configuration loader.

pub mod config;
pub mod provider;
pub mod sqlite;
