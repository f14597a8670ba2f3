//! Outbound generative provider clients.

pub mod openai_compat;
