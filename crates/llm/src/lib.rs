//! Best-effort natural-language summaries for ranked comparisons.

pub mod annotate;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod retry;

pub use annotate::{annotate_results, AnnotateOptions, SUMMARY_PLACEHOLDER};
pub use provider::{LlmError, Summarizer};
pub use providers::create_summarizer;
pub use providers::ollama::OllamaSummarizer;
pub use retry::RetryPolicy;
