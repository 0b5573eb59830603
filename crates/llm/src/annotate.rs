//! Attach best-effort summaries to ranked results.
//!
//! Summaries never affect ranking and never fail the pipeline: a missing
//! candidate, an error or a timeout all yield [`SUMMARY_PLACEHOLDER`].

use std::collections::HashMap;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use sigsim_compute::ComparisonResult;
use sigsim_core::{DetectionRule, RuleCorpus};
use tracing::{info, warn};

use crate::provider::Summarizer;

pub const SUMMARY_PLACEHOLDER: &str = "summary unavailable";

#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    /// Upper bound for one summary, retries included.
    pub timeout: Duration,
    /// Summaries in flight at once.
    pub concurrency: usize,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            concurrency: 4,
        }
    }
}

/// Fill `summary` on every result. Returns how many real summaries were produced.
pub async fn annotate_results(
    results: &mut [ComparisonResult],
    target: &DetectionRule,
    corpus: &dyn RuleCorpus,
    summarizer: &dyn Summarizer,
    options: &AnnotateOptions,
) -> usize {
    if results.is_empty() {
        return 0;
    }
    let candidates = candidate_rules(results, corpus);

    let summaries: Vec<Option<String>> = stream::iter(results.iter().map(|result| {
        let id = result.candidate_id.as_str();
        let candidate = candidates.get(id);
        summarize_one(target, id, candidate, summarizer, options.timeout)
    }))
    .buffered(options.concurrency.max(1))
    .collect()
    .await;

    let mut produced = 0;
    for (result, summary) in results.iter_mut().zip(summaries) {
        if summary.is_some() {
            produced += 1;
        }
        result.summary = Some(summary.unwrap_or_else(|| SUMMARY_PLACEHOLDER.to_string()));
    }
    info!("Summarized {}/{} results", produced, results.len());
    produced
}

/// Look up the full candidate rules behind `results` in one corpus pass.
fn candidate_rules(results: &[ComparisonResult], corpus: &dyn RuleCorpus) -> HashMap<String, DetectionRule> {
    let wanted: Vec<&str> = results.iter().map(|r| r.candidate_id.as_str()).collect();
    match corpus.rules() {
        Ok(records) => records
            .into_iter()
            .filter_map(Result::ok)
            .filter(|rule| wanted.contains(&rule.id.as_str()))
            .map(|rule| (rule.id.clone(), rule))
            .collect(),
        Err(e) => {
            warn!(error = %e, "Corpus unavailable for summaries");
            HashMap::new()
        }
    }
}

async fn summarize_one(
    target: &DetectionRule,
    id: &str,
    candidate: Option<&DetectionRule>,
    summarizer: &dyn Summarizer,
    timeout: Duration,
) -> Option<String> {
    let Some(candidate) = candidate else {
        warn!(candidate = id, "Candidate not found in corpus, skipping summary");
        return None;
    };
    match tokio::time::timeout(timeout, summarizer.summarize(target, candidate)).await {
        Ok(Ok(text)) => Some(text),
        Ok(Err(e)) => {
            warn!(candidate = id, error = %e, "Summary failed");
            None
        }
        Err(_) => {
            warn!(candidate = id, ?timeout, "Summary timed out");
            None
        }
    }
}
