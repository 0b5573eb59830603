use std::time::Duration;

use async_trait::async_trait;
use sigsim_core::DetectionRule;

/// A best-effort explainer for one (target, candidate) pair.
///
/// Implementations may be slow or unavailable; callers treat every error as
/// non-fatal.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Short natural-language explanation of how `candidate` relates to `target`.
    async fn summarize(
        &self,
        target: &DetectionRule,
        candidate: &DetectionRule,
    ) -> Result<String, LlmError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("provider not configured: {0}")]
    NotConfigured(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl LlmError {
    /// Transport failures, timeouts, throttling and server errors are worth
    /// another attempt; bad requests and unparseable replies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::HttpError(_) | LlmError::Timeout(_) => true,
            LlmError::ApiError { status, .. } => *status == 429 || *status >= 500,
            LlmError::ParseError(_) | LlmError::NotConfigured(_) => false,
        }
    }
}
