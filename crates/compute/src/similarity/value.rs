use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use super::gate::is_meaningful_match_with;
use super::sequence::ratio;
use crate::config::ValueScoring;

fn word_tokens() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+").expect("valid regex"))
}

/// Best-match average of `a` against `b`.
///
/// Each value of `a` is paired with its highest-scoring partner in `b`; the
/// result is the mean of those best scores over all of `a`. Not symmetric.
/// Returns 0.0 when either list is empty.
pub fn value_similarity(a: &[String], b: &[String], scoring: &ValueScoring) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let total: f64 = a
        .iter()
        .map(|value| best_match(value, b, scoring).map_or(0.0, |(_, score)| score))
        .sum();
    total / a.len() as f64
}

/// Highest-scoring partner of `value` in `candidates` as `(index, score)`.
///
/// The earliest index wins ties. `None` when nothing scores above zero.
pub fn best_match(value: &str, candidates: &[String], scoring: &ValueScoring) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        let score = pair_score(value, candidate, scoring);
        if score > best.map_or(0.0, |(_, s)| s) {
            best = Some((idx, score));
        }
    }
    best
}

/// Gated similarity of one value pair, in [0, 1].
pub fn pair_score(s1: &str, s2: &str, scoring: &ValueScoring) -> f64 {
    let s1 = s1.to_lowercase();
    let s2 = s2.to_lowercase();
    let combined = combined_score(&s1, &s2, scoring);
    if is_meaningful_match_with(&s1, &s2, combined, scoring.prefix_gate) {
        combined
    } else {
        0.0
    }
}

// Base ratio adjusted by the substring bonus or the shared-token penalty.
fn combined_score(s1: &str, s2: &str, scoring: &ValueScoring) -> f64 {
    let base = ratio(s1, s2);
    let bonus = substring_bonus(s1, s2, scoring);
    let penalty = if bonus == 0.0 && shares_plain_token(s1, s2) {
        scoring.token_penalty
    } else {
        0.0
    };
    (base + bonus - penalty).clamp(0.0, 1.0)
}

fn substring_bonus(s1: &str, s2: &str, scoring: &ValueScoring) -> f64 {
    if !(s1.contains(s2) || s2.contains(s1)) {
        return 0.0;
    }
    let len1 = s1.chars().count();
    let len2 = s2.chars().count();
    let longest = len1.max(len2);
    if longest == 0 {
        return 0.0;
    }
    let length_ratio = len1.min(len2) as f64 / longest as f64;
    if length_ratio >= scoring.full_bonus_ratio {
        scoring.substring_bonus
    } else if length_ratio >= scoring.min_bonus_ratio {
        scoring.reduced_bonus
    } else {
        0.0
    }
}

// A shared token counts only when it is purely alphabetic or purely numeric.
fn shares_plain_token(s1: &str, s2: &str) -> bool {
    let tokens1: HashSet<&str> = word_tokens().find_iter(s1).map(|m| m.as_str()).collect();
    word_tokens()
        .find_iter(s2)
        .map(|m| m.as_str())
        .filter(|token| tokens1.contains(token))
        .any(|token| {
            token.chars().all(char::is_alphabetic) || token.chars().all(char::is_numeric)
        })
}
