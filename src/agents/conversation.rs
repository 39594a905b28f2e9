//! Free-form questions about a document

use crate::error::Result;
use crate::llm::TextModel;
use crate::prompts;
use crate::rate_limiter::RateGate;
use crate::telemetry::{Event, EventLevel};
use std::sync::Arc;
use tracing::error;

/// Answer returned when a question could not be put to the model
pub const QUERY_FAILED: &str =
    "Error: Unable to process query due to rate limits. Please try again later.";

/// Answers ad hoc questions about a document, one gated request each
pub struct QueryService {
    model: Arc<dyn TextModel>,
    gate: Arc<RateGate>,
}

impl QueryService {
    /// Creates a query service sharing `gate` with other consumers
    pub fn new(model: Arc<dyn TextModel>, gate: Arc<RateGate>) -> Self {
        Self { model, gate }
    }

    /// The prompt sent for `question` about `document`
    pub fn prompt(&self, document: &str, question: &str) -> String {
        prompts::render(
            prompts::DOCUMENT_QUESTION,
            &[("question", question), ("document", document)],
        )
    }

    /// Returns the model's raw answer, or [`QUERY_FAILED`] on any failure
    pub async fn query(&self, document: &str, question: &str) -> String {
        match self.try_query(document, question).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("Error querying document: {}", e);
                self.gate.emit(
                    Event::new("query.failed")
                        .level(EventLevel::Warn)
                        .with("error", &e),
                );
                QUERY_FAILED.to_string()
            }
        }
    }

    /// Returns the model's raw answer, surfacing the first failure
    pub async fn try_query(&self, document: &str, question: &str) -> Result<String> {
        let prompt = self.prompt(document, question);
        let model = &self.model;
        let prompt = prompt.as_str();
        self.gate.run(move || model.generate(prompt)).await
    }
}
