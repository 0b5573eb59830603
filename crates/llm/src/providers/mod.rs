pub mod ollama;

use sigsim_core::config::OllamaConfig;

use crate::provider::{LlmError, Summarizer};

/// Create the configured summarizer, or `NotConfigured` when summaries are off.
pub fn create_summarizer(config: &OllamaConfig) -> Result<Box<dyn Summarizer>, LlmError> {
    Ok(Box::new(ollama::OllamaSummarizer::from_config(config)?))
}
