//! Analyzers producing the parts of an [`AnalysisResult`](super::AnalysisResult)
//!
//! Each analyzer sends one fixed prompt through the rate gate, extracts a
//! JSON object from the reply, and validates it. `analyze` never fails: any
//! transport, extraction, or validation error is logged and replaced by the
//! analyzer's canned fallback, so one bad reply degrades one part only.

use super::{Risk, Section, SectionKind, Severity};
use crate::error::{AnalyzerError, Result};
use crate::extract::extract_json_object;
use crate::llm::TextModel;
use crate::prompts;
use crate::rate_limiter::RateGate;
use crate::telemetry::{Event, EventLevel};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Summary used when no summary could be produced
pub const SUMMARY_FALLBACK: &str =
    "Unable to generate summary due to an error. Please try again or review the document manually.";

/// Description of the single risk used when no risks could be produced
pub const RISK_FALLBACK: &str =
    "Unable to analyze risks due to an error. Please try again or review the document manually.";

async fn request_object(
    model: &Arc<dyn TextModel>,
    gate: &RateGate,
    analyzer: &'static str,
    prompt: &str,
) -> Result<Map<String, Value>> {
    let reply = gate.run(move || model.generate(prompt)).await?;
    debug!("{} raw response: {}", analyzer, reply);
    gate.emit(
        Event::new("analyzer.reply")
            .level(EventLevel::Debug)
            .with("analyzer", analyzer)
            .with("bytes", reply.len()),
    );
    extract_json_object(&reply)
}

/// Reads a string field that must contain something other than whitespace
fn required_str<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            AnalyzerError::Validation(format!("Invalid response structure - missing {}", key))
        })
}

fn report_completed(gate: &RateGate, analyzer: &'static str) {
    gate.emit(Event::new("analyzer.completed").with("analyzer", analyzer));
}

fn report_fallback(gate: &RateGate, analyzer: &'static str, error: &AnalyzerError) {
    warn!("{} analysis error: {}", analyzer, error);
    gate.emit(
        Event::new("analyzer.fallback")
            .level(EventLevel::Warn)
            .with("analyzer", analyzer)
            .with("error", error),
    );
}

/// Produces one fixed-title section
pub struct SectionAnalyzer {
    kind: SectionKind,
    model: Arc<dyn TextModel>,
    gate: Arc<RateGate>,
}

impl SectionAnalyzer {
    /// Creates an analyzer for `kind`
    pub fn new(kind: SectionKind, model: Arc<dyn TextModel>, gate: Arc<RateGate>) -> Self {
        Self { kind, model, gate }
    }

    /// Analyzer for the "Privacy Policy" section
    pub fn privacy_policy(model: Arc<dyn TextModel>, gate: Arc<RateGate>) -> Self {
        Self::new(SectionKind::PrivacyPolicy, model, gate)
    }

    /// Analyzer for the "Data Sharing" section
    pub fn data_sharing(model: Arc<dyn TextModel>, gate: Arc<RateGate>) -> Self {
        Self::new(SectionKind::DataSharing, model, gate)
    }

    /// Analyzer for the "User Responsibilities" section
    pub fn user_responsibilities(model: Arc<dyn TextModel>, gate: Arc<RateGate>) -> Self {
        Self::new(SectionKind::UserResponsibilities, model, gate)
    }

    /// The section kind this analyzer produces
    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        match self.kind {
            SectionKind::PrivacyPolicy => "privacy",
            SectionKind::DataSharing => "sharing",
            SectionKind::UserResponsibilities => "responsibilities",
            SectionKind::Error => "error",
        }
    }

    /// The prompt sent for `document`, if this kind has one
    pub fn prompt(&self, document: &str) -> Option<String> {
        let template = match self.kind {
            SectionKind::PrivacyPolicy => prompts::PRIVACY_POLICY,
            SectionKind::DataSharing => prompts::DATA_SHARING,
            SectionKind::UserResponsibilities => prompts::USER_RESPONSIBILITIES,
            SectionKind::Error => return None,
        };
        Some(prompts::render(template, &[("document", document)]))
    }

    /// Produces the section, or its fallback on any failure
    pub async fn analyze(&self, document: &str) -> Section {
        match self.try_analyze(document).await {
            Ok(section) => {
                report_completed(&self.gate, self.name());
                section
            }
            Err(e) => {
                report_fallback(&self.gate, self.name(), &e);
                Section::fallback(self.kind)
            }
        }
    }

    /// Produces the section, surfacing the first failure
    ///
    /// The returned section always carries the kind's fixed title, whatever
    /// title the model echoed back.
    pub async fn try_analyze(&self, document: &str) -> Result<Section> {
        let prompt = self.prompt(document).ok_or_else(|| {
            AnalyzerError::Unexpected(format!("no prompt for section {}", self.kind))
        })?;
        let object = request_object(&self.model, &self.gate, self.name(), &prompt).await?;

        let title = required_str(&object, "title")?;
        let content = required_str(&object, "content")?;
        if title != self.kind.title() {
            debug!("Model titled {:?} as {:?}", self.kind.title(), title);
        }

        Ok(Section::new(self.kind, content))
    }
}

/// Produces the document summary
pub struct SummaryAnalyzer {
    model: Arc<dyn TextModel>,
    gate: Arc<RateGate>,
}

impl SummaryAnalyzer {
    /// Creates a summary analyzer
    pub fn new(model: Arc<dyn TextModel>, gate: Arc<RateGate>) -> Self {
        Self { model, gate }
    }

    /// The prompt sent for `document`
    pub fn prompt(&self, document: &str) -> String {
        prompts::render(prompts::DOCUMENT_SUMMARY, &[("document", document)])
    }

    /// Produces the summary, or [`SUMMARY_FALLBACK`] on any failure
    pub async fn analyze(&self, document: &str) -> String {
        match self.try_analyze(document).await {
            Ok(summary) => {
                report_completed(&self.gate, "summary");
                summary
            }
            Err(e) => {
                report_fallback(&self.gate, "summary", &e);
                SUMMARY_FALLBACK.to_string()
            }
        }
    }

    /// Produces the summary, surfacing the first failure
    pub async fn try_analyze(&self, document: &str) -> Result<String> {
        let prompt = self.prompt(document);
        let object = request_object(&self.model, &self.gate, "summary", &prompt).await?;
        Ok(required_str(&object, "summary")?.to_string())
    }
}

/// Produces the list of risks
pub struct RiskAnalyzer {
    model: Arc<dyn TextModel>,
    gate: Arc<RateGate>,
}

impl RiskAnalyzer {
    /// Creates a risk analyzer
    pub fn new(model: Arc<dyn TextModel>, gate: Arc<RateGate>) -> Self {
        Self { model, gate }
    }

    /// The prompt sent for `document`
    pub fn prompt(&self, document: &str) -> String {
        prompts::render(prompts::RISK_ASSESSMENT, &[("document", document)])
    }

    /// Produces at least one risk; a single fallback risk on any failure
    pub async fn analyze(&self, document: &str) -> Vec<Risk> {
        match self.try_analyze(document).await {
            Ok(risks) => {
                report_completed(&self.gate, "risks");
                risks
            }
            Err(e) => {
                report_fallback(&self.gate, "risks", &e);
                vec![Risk::fallback(RISK_FALLBACK)]
            }
        }
    }

    /// Produces the validated risks, surfacing the first failure
    pub async fn try_analyze(&self, document: &str) -> Result<Vec<Risk>> {
        let prompt = self.prompt(document);
        let object = request_object(&self.model, &self.gate, "risks", &prompt).await?;
        self.validate(&object)
    }

    /// Keeps the well-formed entries of a `{"risks": [...]}` object
    ///
    /// Fails when `risks` is not an array or when no entry survives.
    pub fn validate(&self, object: &Map<String, Value>) -> Result<Vec<Risk>> {
        let items = object
            .get("risks")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                AnalyzerError::Validation("Invalid response structure - missing risks array".into())
            })?;

        let mut risks = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match parse_risk(item) {
                Some(risk) => risks.push(risk),
                None => {
                    debug!("Invalid risk object: {}", item);
                    self.gate.emit(
                        Event::new("risk.discarded")
                            .level(EventLevel::Debug)
                            .with("index", index),
                    );
                }
            }
        }

        if risks.is_empty() {
            return Err(AnalyzerError::NoValidRisks);
        }
        Ok(risks)
    }
}

/// Parses one risk entry; `None` when severity or description is unusable
pub fn parse_risk(item: &Value) -> Option<Risk> {
    let severity: Severity = item.get("severity")?.as_str()?.parse().ok()?;
    let description = item.get("description")?.as_str()?;
    if description.trim().is_empty() {
        return None;
    }
    Some(Risk::ai_identified(severity, description))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{TAG_AI_IDENTIFIED, TAG_ANALYSIS_FAILED, TAG_ERROR};
    use crate::llm::MockTextModel;
    use crate::rate_limiter::RetryPolicy;
    use crate::telemetry::MemorySink;
    use crate::testing::FakeClock;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn gate_with_sink() -> (Arc<RateGate>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let policy = RetryPolicy {
            delay_between_requests: Duration::from_millis(10),
            ..RetryPolicy::default()
        };
        let gate = RateGate::with_clock(policy, Arc::new(FakeClock::new())).with_sink(sink.clone());
        (Arc::new(gate), sink)
    }

    fn model_replying(reply: &'static str) -> Arc<dyn TextModel> {
        let mut model = MockTextModel::new();
        model
            .expect_generate()
            .times(1)
            .returning(move |_| Ok(reply.to_string()));
        Arc::new(model)
    }

    #[tokio::test]
    async fn test_privacy_section_from_prose_wrapped_reply() {
        let (gate, sink) = gate_with_sink();
        let model = model_replying(
            "Sure, here it is: {\"title\":\"Privacy Policy\",\"content\":\"X\"} — hope that helps",
        );

        let section = SectionAnalyzer::privacy_policy(model, gate).analyze("doc").await;

        assert_eq!(section, Section::new(SectionKind::PrivacyPolicy, "X"));
        assert_eq!(sink.count("analyzer.completed"), 1);
        assert_eq!(sink.count("analyzer.fallback"), 0);
    }

    #[tokio::test]
    async fn test_section_prompt_embeds_document_and_title() {
        let (gate, _) = gate_with_sink();
        let mut model = MockTextModel::new();
        model
            .expect_generate()
            .withf(|prompt: &str| {
                prompt.contains("\"title\": \"User Responsibilities\"")
                    && prompt.ends_with("Document to analyze:\nYou must be 18.")
            })
            .times(1)
            .returning(|_| Ok(r#"{"title": "User Responsibilities", "content": "Be 18+"}"#.into()));

        let section = SectionAnalyzer::user_responsibilities(Arc::new(model), gate)
            .analyze("You must be 18.")
            .await;
        assert_eq!(section.content, "Be 18+");
    }

    #[tokio::test]
    async fn test_section_keeps_fixed_title() {
        let (gate, _) = gate_with_sink();
        let model = model_replying(r#"{"title": "Third Parties", "content": "Shared with ads partners"}"#);

        let section = SectionAnalyzer::data_sharing(model, gate).analyze("doc").await;
        assert_eq!(section.title, "Data Sharing");
        assert_eq!(section.content, "Shared with ads partners");
    }

    #[tokio::test]
    async fn test_section_missing_content_falls_back() {
        let (gate, sink) = gate_with_sink();
        let model = model_replying(r#"{"title": "Data Sharing", "content": ""}"#);

        let section = SectionAnalyzer::data_sharing(model, gate).analyze("doc").await;

        assert_eq!(section, Section::fallback(SectionKind::DataSharing));
        let fallback = sink.named("analyzer.fallback");
        assert_eq!(fallback.len(), 1);
        assert_eq!(fallback[0].field("analyzer"), Some("sharing"));
    }

    #[tokio::test]
    async fn test_blank_fields_fall_back() {
        let (gate, sink) = gate_with_sink();
        let section = SectionAnalyzer::privacy_policy(
            model_replying(r#"{"title": "Privacy Policy", "content": "  \n\t "}"#),
            gate.clone(),
        )
        .analyze("doc")
        .await;
        assert_eq!(section, Section::fallback(SectionKind::PrivacyPolicy));

        let summary = SummaryAnalyzer::new(model_replying(r#"{"summary": "   "}"#), gate)
            .analyze("doc")
            .await;
        assert_eq!(summary, SUMMARY_FALLBACK);
        assert_eq!(sink.count("analyzer.fallback"), 2);
    }

    #[tokio::test]
    async fn test_section_without_json_falls_back() {
        let (gate, _) = gate_with_sink();
        let model = model_replying("I'm sorry, I can't analyze that document.");

        let section = SectionAnalyzer::privacy_policy(model, gate).analyze("doc").await;
        assert_eq!(section, Section::fallback(SectionKind::PrivacyPolicy));
    }

    #[tokio::test]
    async fn test_section_transport_error_falls_back() {
        let (gate, _) = gate_with_sink();
        let mut model = MockTextModel::new();
        model
            .expect_generate()
            .times(1)
            .returning(|_| Err(AnalyzerError::Network("connection reset".into())));

        let section = SectionAnalyzer::user_responsibilities(Arc::new(model), gate)
            .analyze("doc")
            .await;
        assert_eq!(section, Section::fallback(SectionKind::UserResponsibilities));
    }

    #[tokio::test]
    async fn test_section_double_throttle_falls_back() {
        let (gate, sink) = gate_with_sink();
        let mut model = MockTextModel::new();
        model
            .expect_generate()
            .times(2)
            .returning(|_| Err(AnalyzerError::RateLimitExceeded("429".into())));

        let section = SectionAnalyzer::privacy_policy(Arc::new(model), gate)
            .analyze("doc")
            .await;

        assert_eq!(section, Section::fallback(SectionKind::PrivacyPolicy));
        assert_eq!(sink.count("rate_gate.throttled"), 1);
    }

    #[tokio::test]
    async fn test_error_kind_has_no_prompt() {
        let (gate, _) = gate_with_sink();
        let mut model = MockTextModel::new();
        model.expect_generate().never();

        let analyzer = SectionAnalyzer::new(SectionKind::Error, Arc::new(model), gate);
        assert!(analyzer.prompt("doc").is_none());
        assert_eq!(analyzer.analyze("doc").await, Section::fallback(SectionKind::Error));
    }

    #[tokio::test]
    async fn test_summary_success_and_fallback() {
        let (gate, _) = gate_with_sink();
        let ok = SummaryAnalyzer::new(
            model_replying(r#"{"summary": "A streaming service agreement."}"#),
            gate.clone(),
        );
        assert_eq!(ok.analyze("doc").await, "A streaming service agreement.");

        let bad = SummaryAnalyzer::new(model_replying(r#"{"overview": "wrong key"}"#), gate);
        assert_eq!(bad.analyze("doc").await, SUMMARY_FALLBACK);
    }

    #[tokio::test]
    async fn test_risks_filtered_case_insensitively() {
        let (gate, sink) = gate_with_sink();
        let model = model_replying(
            r#"{"risks": [
                {"severity": "HIGH", "description": "Unilateral termination"},
                {"severity": "critical", "description": "Not a real tier"},
                {"severity": "Low", "description": "Newsletter opt-out"}
            ]}"#,
        );

        let risks = RiskAnalyzer::new(model, gate).analyze("doc").await;

        assert_eq!(
            risks,
            vec![
                Risk::ai_identified(Severity::High, "Unilateral termination"),
                Risk::ai_identified(Severity::Low, "Newsletter opt-out"),
            ]
        );
        assert!(risks.iter().all(|r| r.tags == vec![TAG_AI_IDENTIFIED]));
        assert_eq!(sink.named("risk.discarded")[0].field("index"), Some("1"));
    }

    #[tokio::test]
    async fn test_no_valid_risks_yields_single_fallback() {
        let (gate, _) = gate_with_sink();
        let model = model_replying(
            r#"{"risks": [{"severity": "severe", "description": "x"}, {"severity": "low"}]}"#,
        );

        let risks = RiskAnalyzer::new(model, gate).analyze("doc").await;

        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].severity, Severity::High);
        assert_eq!(risks[0].description, RISK_FALLBACK);
        assert_eq!(risks[0].tags, vec![TAG_ERROR, TAG_ANALYSIS_FAILED]);
    }

    #[tokio::test]
    async fn test_validate_reports_no_valid_risks() {
        let (gate, _) = gate_with_sink();
        let analyzer = RiskAnalyzer::new(Arc::new(MockTextModel::new()), gate);

        let empty = json!({"risks": []});
        assert!(matches!(
            analyzer.validate(empty.as_object().unwrap()),
            Err(AnalyzerError::NoValidRisks)
        ));

        let not_array = json!({"risks": "none"});
        assert!(matches!(
            analyzer.validate(not_array.as_object().unwrap()),
            Err(AnalyzerError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_risk_rejects_blank_description() {
        assert!(parse_risk(&json!({"severity": "medium", "description": "   "})).is_none());
        assert!(parse_risk(&json!({"severity": 3, "description": "x"})).is_none());
        assert!(parse_risk(&json!("high")).is_none());
        assert_eq!(
            parse_risk(&json!({"severity": " Medium ", "description": "Fees may change"})),
            Some(Risk::ai_identified(Severity::Medium, "Fees may change"))
        );
    }
}
