//! Batch comparison of one target rule against a whole corpus.
//!
//! Each candidate is scored as an independent task on a fixed-size rayon
//! pool. Tasks share only the read-only target profile and corpus snapshot.
//! A malformed record or a panicking scorer costs that one candidate, never
//! the batch. Results are collected in corpus order before ranking, so the
//! output never depends on which worker finished first.

mod cancel;

#[cfg(test)]
mod tests;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use sigsim_core::{CorpusError, CorpusRecord, DetectionRule, RuleCorpus};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ScoringConfig};
use crate::ranking::{ComparisonResult, CompositeRanker, Profile, Scored};

pub use cancel::CancelToken;

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Invalid scoring configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),
}

/// Counters for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    /// Records enumerated from the corpus.
    pub total: usize,
    pub scored: usize,
    /// Malformed records and scorer panics.
    pub failed: usize,
    /// Not scored because the batch was cancelled.
    pub skipped: usize,
    /// Scored candidates at or above the threshold, before top-N truncation.
    pub matched: usize,
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub results: Vec<ComparisonResult>,
    pub report: BatchReport,
}

enum TaskOutcome<'a> {
    Scored(Scored<'a>),
    Failed,
    Skipped,
}

/// Runs inside each task just before scoring; lets tests cancel or panic mid-batch.
#[cfg(test)]
type TaskHook = Box<dyn Fn(&DetectionRule, &CancelToken) + Send + Sync>;

/// Fans a target rule out over a corpus on a bounded worker pool.
pub struct BatchOrchestrator {
    ranker: CompositeRanker,
    pool: rayon::ThreadPool,
    #[cfg(test)]
    hook: Option<TaskHook>,
}

impl BatchOrchestrator {
    /// Build an orchestrator with `workers` threads (0 lets rayon decide).
    pub fn new(config: ScoringConfig, workers: usize) -> Result<Self, BatchError> {
        let ranker = CompositeRanker::new(config)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sigsim-score-{i}"))
            .build()?;
        Ok(Self {
            ranker,
            pool,
            #[cfg(test)]
            hook: None,
        })
    }

    #[cfg(test)]
    fn with_hook(
        mut self,
        hook: impl Fn(&DetectionRule, &CancelToken) + Send + Sync + 'static,
    ) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn ranker(&self) -> &CompositeRanker {
        &self.ranker
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Compare `target` against every record of `corpus`.
    ///
    /// Only a failure to enumerate the corpus is an error; everything
    /// per-candidate is absorbed into the report.
    pub fn compare_all(
        &self,
        target: &DetectionRule,
        corpus: &dyn RuleCorpus,
        cancel: &CancelToken,
    ) -> Result<BatchOutcome, BatchError> {
        let records = corpus.rules()?;
        Ok(self.compare_records(target, &records, cancel))
    }

    /// Compare `target` against an already-enumerated corpus snapshot.
    pub fn compare_records(
        &self,
        target: &DetectionRule,
        records: &[CorpusRecord],
        cancel: &CancelToken,
    ) -> BatchOutcome {
        let started_at = Utc::now();
        let clock = Instant::now();
        let profile = self.ranker.profile(target);

        info!(
            "Comparing '{}' against {} candidates on {} workers",
            target.id,
            records.len(),
            self.workers()
        );

        let outcomes: Vec<TaskOutcome<'_>> = self.pool.install(|| {
            records
                .par_iter()
                .map(|record| self.run_task(&profile, record, cancel))
                .collect()
        });

        let mut report = BatchReport {
            started_at,
            total: records.len(),
            scored: 0,
            failed: 0,
            skipped: 0,
            matched: 0,
            cancelled: false,
            elapsed_ms: 0,
        };
        let mut scored = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                TaskOutcome::Scored(s) => scored.push(s),
                TaskOutcome::Failed => report.failed += 1,
                TaskOutcome::Skipped => report.skipped += 1,
            }
        }
        report.scored = scored.len();
        report.matched = scored
            .iter()
            .filter(|s| self.ranker.passes(s.weighted))
            .count();

        let results = self.ranker.rank_scored(&profile, scored);

        report.cancelled = cancel.is_cancelled();
        report.elapsed_ms = clock.elapsed().as_millis() as u64;
        if report.cancelled {
            warn!(
                "Batch for '{}' cancelled: {} scored, {} skipped",
                target.id, report.scored, report.skipped
            );
        }
        info!(
            total = report.total,
            scored = report.scored,
            failed = report.failed,
            matched = report.matched,
            returned = results.len(),
            elapsed_ms = report.elapsed_ms,
            "Batch complete"
        );

        BatchOutcome { results, report }
    }

    /// First candidate in corpus order that reaches the threshold.
    ///
    /// Scans sequentially and stops at the first hit. When nothing reaches
    /// the threshold and a [`StepDown`](crate::StepDown) is configured, the
    /// already-scored candidates are searched again at each lower level.
    pub fn find_first(
        &self,
        target: &DetectionRule,
        corpus: &dyn RuleCorpus,
        cancel: &CancelToken,
    ) -> Result<Option<ComparisonResult>, BatchError> {
        let records = corpus.rules()?;
        let profile = self.ranker.profile(target);
        let mut misses = Vec::new();

        for record in &records {
            if cancel.is_cancelled() {
                warn!("find_first for '{}' cancelled", target.id);
                break;
            }
            if let TaskOutcome::Scored(scored) = self.run_task(&profile, record, cancel) {
                if self.ranker.passes(scored.weighted) {
                    return Ok(Some(self.ranker.to_result(&profile, scored)));
                }
                misses.push(scored);
            }
        }

        let Some(step_down) = self.ranker.config().step_down else {
            return Ok(None);
        };
        for level in step_down.levels(self.ranker.config().threshold) {
            if let Some(pos) = misses.iter().position(|s| s.weighted >= level) {
                info!(
                    "No match for '{}' at threshold {:.2}, found one at {:.2}",
                    target.id,
                    self.ranker.config().threshold,
                    level
                );
                return Ok(Some(self.ranker.to_result(&profile, misses.swap_remove(pos))));
            }
        }
        Ok(None)
    }

    fn run_task<'a>(
        &self,
        target: &Profile<'_>,
        record: &'a CorpusRecord,
        cancel: &CancelToken,
    ) -> TaskOutcome<'a> {
        if cancel.is_cancelled() {
            return TaskOutcome::Skipped;
        }

        let candidate = match record {
            Ok(rule) => rule,
            Err(malformed) => {
                warn!(
                    source = %malformed.source_id,
                    reason = %malformed.reason,
                    "Dropping malformed candidate"
                );
                return TaskOutcome::Failed;
            }
        };

        let scored = panic::catch_unwind(AssertUnwindSafe(|| {
            #[cfg(test)]
            if let Some(hook) = &self.hook {
                hook(candidate, cancel);
            }
            self.ranker.score(target, candidate)
        }));
        match scored {
            // A task that finished after cancellation does not contribute.
            Ok(_) if cancel.is_cancelled() => TaskOutcome::Skipped,
            Ok(scored) => {
                debug!(candidate = %candidate.id, weighted = scored.weighted, "scored");
                TaskOutcome::Scored(scored)
            }
            Err(payload) => {
                warn!(
                    "Scoring candidate '{}' panicked: {}",
                    candidate.id,
                    panic_message(payload.as_ref())
                );
                TaskOutcome::Failed
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
