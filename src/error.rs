use std::io;
use thiserror::Error;

/// Custom result type alias for the crate
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Errors that can occur while analyzing a document
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The document was empty or whitespace only
    #[error("Empty content provided")]
    EmptyInput,

    /// I/O errors
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Network connectivity errors
    #[error("Network error: {0}")]
    Network(String),

    /// The text-generation endpoint signalled "too many requests"
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Language model errors other than throttling
    #[error("LLM error: {0}")]
    LLM(String),

    /// No JSON object could be recovered from a model reply
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// A recovered object was missing fields or carried invalid values
    #[error("Validation error: {0}")]
    Validation(String),

    /// Every risk item in a reply was filtered out
    #[error("No valid risks in response")]
    NoValidRisks,

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Failures nothing else anticipated
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AnalyzerError {
    /// Checks if this error is a throttle signal that warrants a backoff retry
    pub fn is_throttle(&self) -> bool {
        match self {
            Self::RateLimitExceeded(_) => true,
            Self::Http(e) => e.status().map_or(false, |s| s.as_u16() == 429),
            _ => false,
        }
    }
}
