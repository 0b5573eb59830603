//! Meaningful-match gate: rejects fuzzy matches that look coincidental.

use std::collections::BTreeSet;

use crate::config::GatePreset;

/// Gate with the default (loose) prefix threshold.
pub fn is_meaningful_match(s1: &str, s2: &str, score: f64) -> bool {
    is_meaningful_match_with(s1, s2, score, GatePreset::default().prefix_gate())
}

/// Decide whether `score` for the pair `s1`, `s2` reflects a real relation.
///
/// Rules are tiered by the length of the shorter string (in chars, after
/// lowercasing):
///
/// * 1 char: exact equality only.
/// * 2 chars: prefix relation with `score > 0.8`, otherwise equality.
/// * shorter/longer ratio below 0.4: reject.
/// * 3-5 chars: prefix relation needs `score > prefix_gate`; anything else
///   needs `score >= 0.85` and containment.
/// * 6-10 chars: `score >= 0.6`.
/// * longer: `score >= 0.5`.
///
/// Scores in (0.5, 0.8) are finally rejected when the character sets overlap
/// by more than 0.7 but the first characters differ (shuffled lookalikes).
pub fn is_meaningful_match_with(s1: &str, s2: &str, score: f64, prefix_gate: f64) -> bool {
    let s1 = s1.to_lowercase();
    let s2 = s2.to_lowercase();
    if s1.is_empty() || s2.is_empty() {
        return false;
    }

    let len1 = s1.chars().count();
    let len2 = s2.chars().count();
    let (short, long) = (len1.min(len2), len1.max(len2));
    let prefixed = s1.starts_with(&s2) || s2.starts_with(&s1);

    match short {
        1 => return s1 == s2,
        2 if prefixed => return score > 0.8,
        2 => return s1 == s2,
        _ => {}
    }

    if (short as f64) / (long as f64) < 0.4 {
        return false;
    }

    if short <= 5 {
        if prefixed {
            return score > prefix_gate;
        }
        if score < 0.85 || !(s1.contains(&s2) || s2.contains(&s1)) {
            return false;
        }
    } else if short <= 10 {
        if score < 0.6 {
            return false;
        }
    } else if score < 0.5 {
        return false;
    }

    !(score > 0.5 && score < 0.8 && looks_shuffled(&s1, &s2))
}

fn looks_shuffled(s1: &str, s2: &str) -> bool {
    let chars1: BTreeSet<char> = s1.chars().collect();
    let chars2: BTreeSet<char> = s2.chars().collect();
    let shared = chars1.intersection(&chars2).count();
    let union = chars1.union(&chars2).count();
    let overlap = shared as f64 / union as f64;
    overlap > 0.7 && s1.chars().next() != s2.chars().next()
}
