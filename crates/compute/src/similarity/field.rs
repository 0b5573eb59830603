use std::collections::BTreeSet;

/// Jaccard similarity of two field sets.
///
/// Returns 0.0 when either side is empty: a rule without detection fields
/// never matches anything, not even another empty rule.
pub fn field_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    shared as f64 / union as f64
}
