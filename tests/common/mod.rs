#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use terms_analyzer::testing::{FakeClock, Reply, ScriptedModel};
use terms_analyzer::{AnalysisOrchestrator, MemorySink, RateGate, RetryPolicy};

pub mod test_helpers {
    use super::*;

    pub const DELAY: Duration = Duration::from_secs(30);

    pub const DOCUMENT: &str = "ACME TERMS OF SERVICE. We collect your email address. \
        We may share usage data with advertising partners. You must be 18 or older. \
        Disputes are resolved by binding arbitration.";

    /// Which request a prompt belongs to
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum PromptKind {
        Summary,
        Privacy,
        Sharing,
        Responsibilities,
        Risks,
        Question,
    }

    pub fn classify(prompt: &str) -> PromptKind {
        if prompt.contains("summary of this terms and conditions") {
            PromptKind::Summary
        } else if prompt.contains("specializing in privacy policies") {
            PromptKind::Privacy
        } else if prompt.contains("data sharing aspects") {
            PromptKind::Sharing
        } else if prompt.contains("user responsibilities in this") {
            PromptKind::Responsibilities
        } else if prompt.contains("specializing in risk assessment") {
            PromptKind::Risks
        } else if prompt.contains("please answer this question") {
            PromptKind::Question
        } else {
            panic!("unrecognized prompt: {}", prompt)
        }
    }

    /// A well-behaved model reply for each kind of prompt, formatted the way
    /// real replies tend to be: wrapped in prose or code fences.
    pub fn canned_reply(prompt: &str) -> Reply {
        Reply::text(match classify(prompt) {
            PromptKind::Summary => {
                "Here is the summary:\n{\"summary\": \"Acme offers a paid service with arbitration.\"}"
            }
            PromptKind::Privacy => {
                "```json\n{\"title\": \"Privacy\", \"content\": \"Collects email addresses.\"}\n```"
            }
            PromptKind::Sharing => {
                "{\"title\": \"Data Sharing\", \"content\": \"Usage data goes to advertisers.\"}"
            }
            PromptKind::Responsibilities => {
                "Sure! {\"title\": \"User Responsibilities\", \"content\": \"Users must be 18+.\"}"
            }
            PromptKind::Risks => {
                r#"{"risks": [
                    {"severity": "HIGH", "description": "Binding arbitration"},
                    {"severity": "critical", "description": "Unknown tier"},
                    {"severity": "low", "description": "Email collection"}
                ]}"#
            }
            PromptKind::Question => "You must be at least 18 years old.",
        })
    }

    pub struct Harness {
        pub clock: Arc<FakeClock>,
        pub sink: Arc<MemorySink>,
        pub model: Arc<ScriptedModel>,
        pub orchestrator: AnalysisOrchestrator,
    }

    impl Harness {
        /// Prompt kinds in the order the model received them
        pub fn prompt_kinds(&self) -> Vec<PromptKind> {
            self.model.prompts().iter().map(|p| classify(p)).collect()
        }

        /// Gaps between consecutive model calls on the virtual clock
        pub fn call_gaps(&self) -> Vec<Duration> {
            self.model
                .calls()
                .windows(2)
                .map(|pair| pair[1].at.duration_since(pair[0].at))
                .collect()
        }
    }

    /// Full pipeline on a virtual clock with a 30 second request gap
    pub fn harness(model: ScriptedModel) -> Harness {
        let clock = Arc::new(FakeClock::new());
        let sink = Arc::new(MemorySink::new());
        let model = Arc::new(model.with_clock(clock.clone()));
        let policy = RetryPolicy {
            delay_between_requests: DELAY,
            ..RetryPolicy::default()
        };
        let gate = Arc::new(RateGate::with_clock(policy, clock.clone()).with_sink(sink.clone()));
        let orchestrator = AnalysisOrchestrator::new(model.clone(), gate);

        Harness {
            clock,
            sink,
            model,
            orchestrator,
        }
    }

    pub fn canned_harness() -> Harness {
        harness(ScriptedModel::from_fn(canned_reply))
    }

    pub fn setup_test_logger() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .try_init();
    }
}
