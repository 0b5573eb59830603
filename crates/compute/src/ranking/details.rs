//! Explanatory diff between a target and a retained candidate.
//!
//! Informational only: nothing here feeds back into ranking or filtering.

use std::collections::BTreeSet;

use serde::Serialize;
use sigsim_core::DetectionRule;

use crate::config::ValueScoring;
use crate::signature::Signature;
use crate::similarity::best_match;

/// Number of leading target values explained in [`ComparisonDetails::value_matches`].
const EXPLAINED_VALUES: usize = 3;

/// Pairs scoring at or below this are not worth showing.
const EXPLAINED_MIN_SCORE: f64 = 0.5;

/// The best partner found for one target value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueMatch {
    pub target_value: String,
    pub candidate_value: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonDetails {
    /// Top-level detection keys present in both rules, sorted.
    pub common_keys: Vec<String>,
    pub unique_to_target: Vec<String>,
    pub unique_to_candidate: Vec<String>,
    /// Log-source blocks are structurally equal.
    pub logsource_match: bool,
    /// Declared levels are equal (two missing levels count as equal).
    pub level_match: bool,
    /// Tags declared by both rules, sorted.
    pub tag_overlap: Vec<String>,
    pub value_matches: Vec<ValueMatch>,
}

impl ComparisonDetails {
    pub(crate) fn between(
        target: &DetectionRule,
        target_sig: &Signature,
        candidate: &DetectionRule,
        candidate_sig: &Signature,
        scoring: &ValueScoring,
    ) -> Self {
        let target_keys: BTreeSet<&str> = target.detection.keys().into_iter().collect();
        let candidate_keys: BTreeSet<&str> = candidate.detection.keys().into_iter().collect();

        Self {
            common_keys: target_keys.intersection(&candidate_keys).map(|k| k.to_string()).collect(),
            unique_to_target: target_keys.difference(&candidate_keys).map(|k| k.to_string()).collect(),
            unique_to_candidate: candidate_keys.difference(&target_keys).map(|k| k.to_string()).collect(),
            logsource_match: target.logsource == candidate.logsource,
            level_match: target.level == candidate.level,
            tag_overlap: target.tags.intersection(&candidate.tags).cloned().collect(),
            value_matches: explain_values(&target_sig.values, &candidate_sig.values, scoring),
        }
    }
}

fn explain_values(target: &[String], candidate: &[String], scoring: &ValueScoring) -> Vec<ValueMatch> {
    target
        .iter()
        .take(EXPLAINED_VALUES)
        .filter_map(|value| {
            let (idx, score) = best_match(value, candidate, scoring)?;
            (score > EXPLAINED_MIN_SCORE).then(|| ValueMatch {
                target_value: value.clone(),
                candidate_value: candidate[idx].clone(),
                score,
            })
        })
        .collect()
}
