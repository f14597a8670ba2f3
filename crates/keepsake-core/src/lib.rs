//! Business logic and repository trait definitions for Keepsake.
//!
//! This crate defines the "ports" (repository and provider traits) that
//! the infrastructure layer implements, plus the continuity engine
//! itself. It depends only on `keepsake-types` -- never on
//! `keepsake-infra` or any database/IO crate.

pub mod interview;
pub mod memory;
pub mod provider;
pub mod repository;
pub mod service;
