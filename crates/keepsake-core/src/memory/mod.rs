//! Memory composition for Keepsake.
//!
//! This module holds the primer compiler that folds a handle's full
//! session history into one stage-organized markdown document, and the
//! read-through session cache the services share.

pub mod cache;
pub mod primer;
