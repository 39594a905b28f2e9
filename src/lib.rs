#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]

//! ## Usage
//! ```rust,ignore
//! use terms_analyzer::{AnalysisOrchestrator, Config};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     let orchestrator = AnalysisOrchestrator::from_config(&config)?;
//!
//!     let result = orchestrator.analyze_document("These Terms govern...").await?;
//!     for risk in &result.risks {
//!         println!("[{}] {}", risk.severity, risk.description);
//!     }
//!     Ok(())
//! }
//! ```

/// Analysis data model and the agents producing it
pub mod agents;
/// Time source used for request spacing
pub mod clock;
/// Configuration module for the application
pub mod config;
/// Error handling types and utilities
pub mod error;
/// Locating JSON objects in free-form model replies
pub mod extract;
/// Generative text model clients
pub mod llm;
/// Logging configuration and utilities
pub mod logging;
/// Sequential analysis pipeline
pub mod orchestrator;
/// Prompt templates sent to the model
pub mod prompts;
/// Request spacing and throttle retries
pub mod rate_limiter;
/// Structured diagnostic events
pub mod telemetry;
/// Deterministic doubles for the model and the clock
pub mod testing;

// Re-export common types
pub use agents::analysis::{RiskAnalyzer, SectionAnalyzer, SummaryAnalyzer};
pub use agents::conversation::{QueryService, QUERY_FAILED};
pub use agents::{AnalysisResult, Risk, Section, SectionKind, Severity};
pub use clock::{Clock, TokioClock};
pub use config::Config;
pub use error::{AnalyzerError, Result};
pub use extract::{extract_as, extract_json_object};
pub use llm::{GeminiClient, TextModel};
pub use orchestrator::AnalysisOrchestrator;
pub use rate_limiter::{RateGate, RetryPolicy};
pub use telemetry::{Event, EventLevel, EventSink, MemorySink, TracingSink};
