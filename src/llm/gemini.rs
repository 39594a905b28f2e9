use super::TextModel;
use crate::config::ModelSettings;
use crate::error::{AnalyzerError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Client for the Gemini `generateContent` REST endpoint
pub struct GeminiClient {
    client: Client,
    settings: ModelSettings,
    api_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GeminiClient {
    /// Creates a client; fails when no API key is configured
    pub fn new(settings: &ModelSettings) -> Result<Self> {
        let api_key = settings.api_key()?.to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| AnalyzerError::Network(e.to_string()))?;

        info!("Using model {} at {}", settings.model, settings.endpoint);

        Ok(Self {
            client,
            settings: settings.clone(),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model
        )
    }
}

/// Maps an unsuccessful HTTP reply to an error, recognizing throttling
fn status_error(status: StatusCode, body: &str) -> AnalyzerError {
    let lowered = body.to_lowercase();
    if status == StatusCode::TOO_MANY_REQUESTS
        || lowered.contains("\"code\": 429")
        || lowered.contains("resource_exhausted")
        || lowered.contains("too many requests")
    {
        AnalyzerError::RateLimitExceeded(format!("HTTP {}: {}", status.as_u16(), body))
    } else {
        AnalyzerError::LLM(format!("HTTP {}: {}", status.as_u16(), body))
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let body: GenerateResponse = response.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AnalyzerError::LLM("Empty response from model".to_string()));
        }

        debug!("Raw AI response: {}", text);
        Ok(text)
    }
}
