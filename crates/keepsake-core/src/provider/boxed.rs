//! BoxGenerativeProvider -- object-safe dynamic dispatch wrapper for
//! GenerativeProvider.
//!
//! 1. Define an object-safe `GenerativeProviderDyn` trait with boxed futures
//! 2. Blanket-impl `GenerativeProviderDyn` for all `T: GenerativeProvider`
//! 3. `BoxGenerativeProvider` wraps `Box<dyn GenerativeProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use keepsake_types::provider::{CompletionRequest, CompletionResponse, ProviderError};

use super::generative::GenerativeProvider;

/// Object-safe version of [`GenerativeProvider`] with boxed futures.
///
/// This trait exists solely to enable dynamic dispatch
/// (`dyn GenerativeProviderDyn`). A blanket implementation is provided for
/// all types implementing `GenerativeProvider`.
pub trait GenerativeProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, ProviderError>> + Send + 'a>>;
}

/// Blanket implementation: any `GenerativeProvider` automatically
/// implements `GenerativeProviderDyn`.
impl<T: GenerativeProvider> GenerativeProviderDyn for T {
    fn name(&self) -> &str {
        GenerativeProvider::name(self)
    }

    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, ProviderError>> + Send + 'a>> {
        Box::pin(self.complete(request))
    }
}

/// Type-erased generative provider for runtime provider selection.
///
/// Since `GenerativeProvider` uses RPITIT, it cannot be used as a trait
/// object directly. `BoxGenerativeProvider` provides equivalent methods
/// that delegate to the inner `GenerativeProviderDyn` trait object.
pub struct BoxGenerativeProvider {
    inner: Box<dyn GenerativeProviderDyn + Send + Sync>,
}

impl BoxGenerativeProvider {
    /// Wrap a concrete `GenerativeProvider` in a type-erased box.
    pub fn new<T: GenerativeProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    /// Human-readable provider name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Send a completion request and receive the full response.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        self.inner.complete_boxed(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_types::provider::Usage;

    struct EchoProvider;

    impl GenerativeProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            let content = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(CompletionResponse {
                id: "echo-1".to_string(),
                content,
                model: request.model.clone(),
                usage: Usage::default(),
            })
        }
    }

    #[tokio::test]
    async fn test_boxed_provider_delegates() {
        use keepsake_types::provider::Message;
        use keepsake_types::session::TurnRole;

        let boxed = BoxGenerativeProvider::new(EchoProvider);
        assert_eq!(boxed.name(), "echo");

        let request = CompletionRequest {
            model: "pico-2".to_string(),
            messages: vec![Message {
                role: TurnRole::User,
                content: "Hello there".to_string(),
            }],
            system: None,
            max_tokens: 64,
            temperature: None,
        };
        let response = boxed.complete(&request).await.unwrap();
        assert_eq!(response.content, "Hello there");
        assert_eq!(response.model, "pico-2");
    }
}
