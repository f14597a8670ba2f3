//! HTTP/REST API layer for Keepsake.
//!
//! Axum-based REST API at `/api/v1/` with envelope response format and
//! CORS support. Intended for same-host capture frontends; there is no
//! authentication layer.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
