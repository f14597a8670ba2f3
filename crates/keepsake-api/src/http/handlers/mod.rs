//! HTTP request handlers for the REST API.

pub mod interview;
pub mod primer;
pub mod session;
