//! Observability layer for Keepsake.
//!
//! Tracing subscriber setup with optional OpenTelemetry export, plus the
//! GenAI semantic-convention attribute names used to instrument generative
//! provider calls.

pub mod genai_attrs;
pub mod tracing_setup;
