use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use sigsim_core::config::OllamaConfig;
use sigsim_core::DetectionRule;
use tracing::debug;

use crate::prompt::comparison_prompt;
use crate::provider::{LlmError, Summarizer};
use crate::retry::RetryPolicy;

const TEMPERATURE: f32 = 0.3;
const TOP_P: f32 = 0.9;
const MAX_PREDICT: u32 = 2000;

/// Summarizer backed by a local Ollama server's `/api/generate` endpoint.
pub struct OllamaSummarizer {
    client: reqwest::Client,
    url: String,
    model: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl OllamaSummarizer {
    pub fn new(url: String, model: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            model,
            timeout,
            retry: RetryPolicy::default(),
        })
    }

    /// Build from config; fails when summaries are disabled.
    pub fn from_config(config: &OllamaConfig) -> Result<Self, LlmError> {
        if !config.enabled {
            return Err(LlmError::NotConfigured("OLLAMA_ENABLED is false".into()));
        }
        Self::new(
            config.url.clone(),
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// One non-streaming generate call.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.url);
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": TEMPERATURE,
                "top_p": TOP_P,
                "num_predict": MAX_PREDICT,
            },
        });

        debug!("Ollama request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout)
                } else {
                    LlmError::HttpError(e)
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: serde_json::Value = response.json().await?;
        let text = resp["response"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError("missing response".into()))?
            .trim()
            .to_string();
        if text.is_empty() {
            return Err(LlmError::ParseError("empty response".into()));
        }
        Ok(text)
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    async fn summarize(
        &self,
        target: &DetectionRule,
        candidate: &DetectionRule,
    ) -> Result<String, LlmError> {
        let prompt = comparison_prompt(target, candidate);
        let label = format!("Ollama summary for '{}'", candidate.id);
        self.retry.run(&label, || self.generate(&prompt)).await
    }
}
