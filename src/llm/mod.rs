//! Completion service client and retry policy.

pub mod gemini;
pub mod retry;
pub mod service;

pub use gemini::GeminiClient;
pub use retry::retry_with_backoff;
pub use service::CompletionService;

#[cfg(test)]
pub use service::MockCompletionService;
