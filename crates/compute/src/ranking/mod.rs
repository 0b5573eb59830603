//! Composite ranking: weight component scores, filter by threshold, order,
//! truncate, and attach diff metadata to what survives.

mod details;

#[cfg(test)]
mod tests;

use serde::Serialize;
use sigsim_core::DetectionRule;
use tracing::debug;

use crate::config::{ConfigError, ScoringConfig};
use crate::signature::{self, Signature};
use crate::similarity::{content_similarity, field_similarity, value_similarity};

pub use details::{ComparisonDetails, ValueMatch};

/// One retained candidate, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub candidate_id: String,
    pub title: String,
    pub field_similarity: f64,
    pub value_similarity: f64,
    /// Only present when the content scorer carries weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_similarity: Option<f64>,
    pub weighted_similarity: f64,
    pub details: ComparisonDetails,
    /// Filled in later by an optional summarizer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A rule with its signature computed once, reused across many comparisons.
#[derive(Debug, Clone)]
pub struct Profile<'a> {
    pub rule: &'a DetectionRule,
    pub signature: Signature,
    text: Option<String>,
}

/// Component scores of one candidate before filtering.
#[derive(Debug, Clone)]
pub struct Scored<'a> {
    pub profile: Profile<'a>,
    pub field: f64,
    pub value: f64,
    pub content: Option<f64>,
    pub weighted: f64,
}

/// Combines field, value and (optionally) content scores into one ranking.
#[derive(Debug, Clone)]
pub struct CompositeRanker {
    config: ScoringConfig,
}

impl CompositeRanker {
    /// Validates the configuration up front; nothing is scored with bad weights.
    pub fn new(config: ScoringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Extract everything scoring needs from `rule`.
    pub fn profile<'a>(&self, rule: &'a DetectionRule) -> Profile<'a> {
        let text = (self.config.weights.content > 0.0)
            .then(|| signature::detection_text(&rule.detection));
        Profile {
            rule,
            signature: signature::extract(&rule.detection),
            text,
        }
    }

    /// Score one candidate against a profiled target.
    pub fn score<'a>(&self, target: &Profile<'_>, candidate: &'a DetectionRule) -> Scored<'a> {
        let profile = self.profile(candidate);
        let weights = &self.config.weights;

        let field = field_similarity(&target.signature.fields, &profile.signature.fields);
        let value = value_similarity(
            &target.signature.values,
            &profile.signature.values,
            &self.config.value_scoring,
        );
        let content = match (&target.text, &profile.text) {
            (Some(a), Some(b)) => Some(content_similarity(a, b)),
            _ => None,
        };

        let weighted = (value * weights.value
            + field * weights.field
            + content.unwrap_or(0.0) * weights.content)
            .clamp(0.0, 1.0);

        Scored {
            profile,
            field,
            value,
            content,
            weighted,
        }
    }

    /// Whether a weighted score survives the threshold (inclusive).
    pub fn passes(&self, weighted: f64) -> bool {
        weighted >= self.config.threshold
    }

    /// Score and rank `candidates` in corpus order.
    pub fn rank(&self, target: &DetectionRule, candidates: &[DetectionRule]) -> Vec<ComparisonResult> {
        let target = self.profile(target);
        let scored = candidates
            .iter()
            .map(|candidate| self.score(&target, candidate))
            .collect();
        self.rank_scored(&target, scored)
    }

    /// Filter, order and truncate already-scored candidates.
    ///
    /// `scored` must be in corpus order: the sort is stable, so equal
    /// weighted scores keep that order.
    pub fn rank_scored(&self, target: &Profile<'_>, scored: Vec<Scored<'_>>) -> Vec<ComparisonResult> {
        let total = scored.len();
        let mut kept: Vec<Scored<'_>> = scored
            .into_iter()
            .filter(|s| self.passes(s.weighted))
            .collect();
        kept.sort_by(|a, b| b.weighted.total_cmp(&a.weighted));

        let matched = kept.len();
        kept.truncate(self.config.top_n);
        debug!(
            total,
            matched,
            returned = kept.len(),
            threshold = self.config.threshold,
            "ranked candidates"
        );

        kept.into_iter()
            .map(|s| self.to_result(target, s))
            .collect()
    }

    pub(crate) fn to_result(&self, target: &Profile<'_>, scored: Scored<'_>) -> ComparisonResult {
        let candidate = scored.profile.rule;
        ComparisonResult {
            candidate_id: candidate.id.clone(),
            title: candidate.title.clone(),
            field_similarity: scored.field,
            value_similarity: scored.value,
            content_similarity: scored.content,
            weighted_similarity: scored.weighted,
            details: ComparisonDetails::between(
                target.rule,
                &target.signature,
                candidate,
                &scored.profile.signature,
                &self.config.value_scoring,
            ),
            summary: None,
        }
    }
}
