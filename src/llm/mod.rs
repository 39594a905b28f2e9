//! Text-generation endpoint abstraction

use crate::error::Result;
use async_trait::async_trait;

/// Google Gemini REST client
pub mod gemini;

pub use gemini::GeminiClient;

/// A model that turns a prompt into unstructured text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Generates a reply for `prompt`
    ///
    /// Throttling must be reported as [`crate::AnalyzerError::RateLimitExceeded`]
    /// so the rate gate can back off and retry.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
