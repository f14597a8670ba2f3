//! Repository trait definitions (ports) for Keepsake.
//!
//! These traits define the persistence interface that keepsake-infra
//! implements with SQLite. Uses native async fn in traits (RPITIT).

pub mod primer;
pub mod session;
