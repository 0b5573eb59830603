//! Pairwise scorers over extracted signatures.
//!
//! - [`field_similarity`]: Jaccard over field-name sets.
//! - [`value_similarity`]: best-match average of gated fuzzy value scores.
//! - [`content_similarity`]: plain sequence ratio over flattened detection text,
//!   used only by the content-weighted preset.

mod field;
mod gate;
mod sequence;
mod value;

pub use field::field_similarity;
pub use gate::{is_meaningful_match, is_meaningful_match_with};
pub use sequence::ratio;
pub use value::{best_match, pair_score, value_similarity};

/// Sequence ratio of two flattened detection texts; 0.0 if either is empty.
pub fn content_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    ratio(a, b)
}
