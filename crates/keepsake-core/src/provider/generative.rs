//! GenerativeProvider trait definition.
//!
//! The single outbound port of the engine: one completion call per ask
//! request. Timeouts and retries are the caller's concern; the trait only
//! promises that a call resolves to a response or a `ProviderError`.

use keepsake_types::provider::{CompletionRequest, CompletionResponse, ProviderError};

/// A generative text provider (e.g., an OpenAI-compatible HTTP API).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). For
/// dynamic dispatch, wrap implementations in
/// [`BoxGenerativeProvider`](super::boxed::BoxGenerativeProvider).
pub trait GenerativeProvider: Send + Sync {
    /// Human-readable provider name, used in logs.
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, ProviderError>> + Send;
}
