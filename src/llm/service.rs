//! The completion service seam.

use async_trait::async_trait;

use crate::error::GenerationError;

/// An opaque text-completion endpoint: one prompt in, free-form text out.
///
/// This abstraction allows mocking the remote service in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send `prompt` and return the raw response text.
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[async_trait]
impl<T: CompletionService + ?Sized> CompletionService for Box<T> {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).complete(prompt).await
    }
}
