use crate::agents::analysis::{RiskAnalyzer, SectionAnalyzer, SummaryAnalyzer};
use crate::agents::conversation::QueryService;
use crate::agents::AnalysisResult;
use crate::config::Config;
use crate::error::{AnalyzerError, Result};
use crate::llm::{GeminiClient, TextModel};
use crate::rate_limiter::{RateGate, RetryPolicy};
use crate::telemetry::{Event, EventLevel};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info};

/// Runs the full analysis of a document
///
/// The five model requests (summary, privacy, sharing, responsibilities,
/// risks) are issued strictly one after another through a single
/// [`RateGate`]; the query service shares that gate.
pub struct AnalysisOrchestrator {
    gate: Arc<RateGate>,
    summary: SummaryAnalyzer,
    privacy: SectionAnalyzer,
    sharing: SectionAnalyzer,
    responsibilities: SectionAnalyzer,
    risks: RiskAnalyzer,
    query: QueryService,
}

impl AnalysisOrchestrator {
    /// Wires every analyzer to `model` behind `gate`
    pub fn new(model: Arc<dyn TextModel>, gate: Arc<RateGate>) -> Self {
        Self {
            summary: SummaryAnalyzer::new(model.clone(), gate.clone()),
            privacy: SectionAnalyzer::privacy_policy(model.clone(), gate.clone()),
            sharing: SectionAnalyzer::data_sharing(model.clone(), gate.clone()),
            responsibilities: SectionAnalyzer::user_responsibilities(model.clone(), gate.clone()),
            risks: RiskAnalyzer::new(model.clone(), gate.clone()),
            query: QueryService::new(model, gate.clone()),
            gate,
        }
    }

    /// Builds the production pipeline: Gemini behind a wall-clock gate
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let model = Arc::new(GeminiClient::new(&config.model)?);
        let gate = Arc::new(RateGate::new(RetryPolicy::from(&config.rate_limits)));
        Ok(Self::new(model, gate))
    }

    /// The gate all requests go through
    pub fn gate(&self) -> &Arc<RateGate> {
        &self.gate
    }

    /// Analyzes `document`
    ///
    /// Fails only with [`AnalyzerError::EmptyInput`]. Every other failure is
    /// absorbed: per part by the analyzers, and as a last resort by
    /// returning [`AnalysisResult::degraded`].
    pub async fn analyze_document(&self, document: &str) -> Result<AnalysisResult> {
        if document.trim().is_empty() {
            return Err(AnalyzerError::EmptyInput);
        }

        info!("Starting document analysis...");
        self.gate.emit(Event::new("analysis.started").with("bytes", document.len()));

        let outcome = AssertUnwindSafe(self.analyze_sequentially(document))
            .catch_unwind()
            .await;

        let failure = match outcome {
            Ok(Ok(result)) => {
                info!("Analysis completed successfully");
                self.gate.emit(
                    Event::new("analysis.completed")
                        .with("sections", result.sections.len())
                        .with("risks", result.risks.len()),
                );
                return Ok(result);
            }
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic_message(panic.as_ref()),
        };

        error!("Error in document analysis: {}", failure);
        self.gate.emit(
            Event::new("analysis.degraded")
                .level(EventLevel::Warn)
                .with("error", &failure),
        );
        Ok(AnalysisResult::degraded(&failure))
    }

    async fn analyze_sequentially(&self, document: &str) -> Result<AnalysisResult> {
        let summary = self.summary.analyze(document).await;
        let privacy = self.privacy.analyze(document).await;
        let sharing = self.sharing.analyze(document).await;
        let responsibilities = self.responsibilities.analyze(document).await;
        let risks = self.risks.analyze(document).await;

        let result = AnalysisResult {
            summary,
            sections: vec![privacy, sharing, responsibilities],
            risks,
        };
        result.check_invariants()?;
        Ok(result)
    }

    /// Answers `question` about `document`; never fails
    pub async fn query_document(&self, document: &str, question: &str) -> String {
        self.query.query(document, question).await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
