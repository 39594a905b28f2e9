//! Document analysis agents
//!
//! This module holds the analysis data model and the agents that fill it:
//! the section, summary, and risk analyzers in [`analysis`] and the
//! question-answering service in [`conversation`]. Every agent talks to the
//! model through the shared [`crate::rate_limiter::RateGate`] and absorbs its
//! own failures by substituting a canned fallback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalyzerError;

pub mod analysis;
pub mod conversation;

/// Tag carried by every model-derived risk
pub const TAG_AI_IDENTIFIED: &str = "ai-identified";
/// Tag carried by fallback risks
pub const TAG_ERROR: &str = "error";
/// Tag carried by fallback risks
pub const TAG_ANALYSIS_FAILED: &str = "analysis-failed";

/// The fixed kinds of section an analysis can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// How personal data is collected, stored, used, and retained
    PrivacyPolicy,
    /// Third-party data sharing
    DataSharing,
    /// What users must comply with
    UserResponsibilities,
    /// Placeholder section of a failed analysis
    Error,
}

impl SectionKind {
    /// The fixed section title
    pub fn title(self) -> &'static str {
        match self {
            Self::PrivacyPolicy => "Privacy Policy",
            Self::DataSharing => "Data Sharing",
            Self::UserResponsibilities => "User Responsibilities",
            Self::Error => "Error",
        }
    }

    /// Content used when the section could not be produced by the model
    pub fn fallback_content(self) -> &'static str {
        match self {
            Self::PrivacyPolicy => "Unable to analyze privacy policy due to an error. Please try again or review the document manually.",
            Self::DataSharing => "Unable to analyze data sharing due to an error. Please try again or review the document manually.",
            Self::UserResponsibilities => "Unable to analyze user responsibilities due to an error. Please try again or review the document manually.",
            Self::Error => "Failed to analyze document. Please try again later.",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One labeled sub-analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Fixed title of the section kind
    pub title: String,
    /// Model-produced or fallback text
    pub content: String,
}

impl Section {
    /// Creates a section of `kind` with the given content
    pub fn new(kind: SectionKind, content: impl Into<String>) -> Self {
        Self {
            title: kind.title().to_string(),
            content: content.into(),
        }
    }

    /// The canned section substituted when analysis fails
    pub fn fallback(kind: SectionKind) -> Self {
        Self::new(kind, kind.fallback_content())
    }
}

/// Severity tier of a risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Serious liability or obligation
    High,
    /// Notable but bounded
    Medium,
    /// Minor
    Low,
}

impl Severity {
    /// Lower-case wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = AnalyzerError;

    /// Case-insensitive; surrounding whitespace is ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(AnalyzerError::Validation(format!("invalid severity: {}", other))),
        }
    }
}

/// One identified liability or obligation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    /// Severity tier
    pub severity: Severity,
    /// Free-text description
    pub description: String,
    /// Ordered, duplicate-free tags
    pub tags: Vec<String>,
}

impl Risk {
    /// Creates an untagged risk
    pub fn new(severity: Severity, description: impl Into<String>) -> Self {
        Self {
            severity,
            description: description.into(),
            tags: Vec::new(),
        }
    }

    /// A model-derived risk tagged `ai-identified`
    pub fn ai_identified(severity: Severity, description: impl Into<String>) -> Self {
        Self::new(severity, description).tagged(TAG_AI_IDENTIFIED)
    }

    /// A high-severity fallback risk tagged `error`, `analysis-failed`
    pub fn fallback(description: impl Into<String>) -> Self {
        Self::new(Severity::High, description)
            .tagged(TAG_ERROR)
            .tagged(TAG_ANALYSIS_FAILED)
    }

    /// Adds a tag unless already present
    pub fn tagged(mut self, tag: &str) -> Self {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
        self
    }

    /// Whether this risk came from a fallback
    pub fn is_fallback(&self) -> bool {
        self.tags.iter().any(|t| t == TAG_ANALYSIS_FAILED)
    }
}

/// The assembled analysis of one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Short summary of the document
    pub summary: String,
    /// Privacy, data sharing, and user responsibility sections, in that order
    pub sections: Vec<Section>,
    /// At least one risk
    pub risks: Vec<Risk>,
}

impl AnalysisResult {
    /// Summary prefix of a result produced by the safety net
    pub const FAILED_PREFIX: &'static str = "Analysis failed: ";

    /// Well-formed result describing a failed analysis
    pub fn degraded(message: &str) -> Self {
        Self {
            summary: format!("{}{}", Self::FAILED_PREFIX, message),
            sections: vec![Section::fallback(SectionKind::Error)],
            risks: vec![Risk::fallback("Analysis incomplete due to technical issues.")],
        }
    }

    /// Whether this result came from the safety net
    pub fn is_degraded(&self) -> bool {
        self.summary.starts_with(Self::FAILED_PREFIX)
            && self.sections.len() == 1
            && self.sections[0].title == SectionKind::Error.title()
    }

    /// Checks the structural invariants of a complete analysis
    pub fn check_invariants(&self) -> Result<(), AnalyzerError> {
        let expected = [
            SectionKind::PrivacyPolicy,
            SectionKind::DataSharing,
            SectionKind::UserResponsibilities,
        ];
        if self.sections.len() != expected.len() {
            return Err(AnalyzerError::Unexpected(format!(
                "expected {} sections, got {}",
                expected.len(),
                self.sections.len()
            )));
        }
        for (section, kind) in self.sections.iter().zip(expected) {
            if section.title != kind.title() {
                return Err(AnalyzerError::Unexpected(format!(
                    "expected section {:?}, got {:?}",
                    kind.title(),
                    section.title
                )));
            }
        }
        if self.risks.is_empty() {
            return Err(AnalyzerError::Unexpected("no risks in analysis".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("high" => Some(Severity::High); "lower")]
    #[test_case("HIGH" => Some(Severity::High); "upper")]
    #[test_case(" Medium " => Some(Severity::Medium); "padded")]
    #[test_case("Low" => Some(Severity::Low); "title case")]
    #[test_case("critical" => None; "unknown tier")]
    #[test_case("" => None; "empty")]
    fn test_severity_parsing(input: &str) -> Option<Severity> {
        input.parse().ok()
    }

    #[test]
    fn test_risk_serialization_shape() {
        let risk = Risk::ai_identified(Severity::Medium, "Arbitration clause");
        let value = serde_json::to_value(&risk).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "severity": "medium",
                "description": "Arbitration clause",
                "tags": ["ai-identified"]
            })
        );
    }

    #[test]
    fn test_fallback_risk_tags_in_order() {
        let risk = Risk::fallback("x").tagged(TAG_ERROR);
        assert_eq!(risk.severity, Severity::High);
        assert_eq!(risk.tags, vec!["error", "analysis-failed"]);
        assert!(risk.is_fallback());
    }

    #[test]
    fn test_degraded_result_shape() {
        let result = AnalysisResult::degraded("boom");
        assert_eq!(result.summary, "Analysis failed: boom");
        assert_eq!(result.sections, vec![Section::new(
            SectionKind::Error,
            "Failed to analyze document. Please try again later."
        )]);
        assert_eq!(result.risks.len(), 1);
        assert!(result.is_degraded());
        assert!(result.check_invariants().is_err());
    }

    #[test]
    fn test_invariants_require_section_order() {
        let mut result = AnalysisResult {
            summary: "s".into(),
            sections: vec![
                Section::fallback(SectionKind::PrivacyPolicy),
                Section::fallback(SectionKind::DataSharing),
                Section::fallback(SectionKind::UserResponsibilities),
            ],
            risks: vec![Risk::fallback("r")],
        };
        assert!(result.check_invariants().is_ok());

        result.sections.swap(0, 1);
        assert!(result.check_invariants().is_err());

        result.sections.swap(0, 1);
        result.risks.clear();
        assert!(result.check_invariants().is_err());
    }
}
