//! Gestalt pattern-matching ratio (Ratcliff/Obershelp).
//!
//! `ratio = 2 * M / T`, where `M` counts characters in matching blocks found
//! by repeatedly taking the longest common substring and recursing on both
//! sides of it, and `T` is the combined length. Ties between equally long
//! blocks go to the earliest position in `a`, then in `b`, so results agree
//! with the classic `SequenceMatcher`, including its popular-element rule:
//! once `b` reaches [`POPULAR_MIN_LEN`] chars, a char occurring in more than
//! `len / 100 + 1` positions of `b` cannot seed a match, only extend one.

use std::collections::HashMap;

/// Length of `b` from which frequent chars stop seeding matches.
pub const POPULAR_MIN_LEN: usize = 200;

/// Similarity of two strings in [0, 1]. Two empty strings are identical.
///
/// Not symmetric once `b` is long enough for the popular-element rule.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let popular = popular_positions(&b);
    2.0 * matching_chars(&a, &b, &popular) as f64 / total as f64
}

/// Marks positions of `b` holding a popular char.
fn popular_positions(b: &[char]) -> Vec<bool> {
    if b.len() < POPULAR_MIN_LEN {
        return vec![false; b.len()];
    }
    let limit = b.len() / 100 + 1;
    let mut counts: HashMap<char, usize> = HashMap::new();
    for &c in b {
        *counts.entry(c).or_default() += 1;
    }
    b.iter().map(|c| counts[c] > limit).collect()
}

fn matching_chars(a: &[char], b: &[char], popular: &[bool]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, popular, (alo, ahi), (blo, bhi));
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }
    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, len)`.
///
/// Blocks are seeded from non-popular chars only, then grown over equal
/// neighbours of any kind.
fn longest_match(
    a: &[char],
    b: &[char],
    popular: &[bool],
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best) = (alo, blo, 0);
    let width = bhi - blo;
    // prev[c] = length of the run ending at a[i - 1], b[blo + c - 1]
    let mut prev = vec![0usize; width + 1];
    let mut curr = vec![0usize; width + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let col = j - blo + 1;
            if a[i] == b[j] && !popular[j] {
                let k = prev[col - 1] + 1;
                curr[col] = k;
                if k > best {
                    best = k;
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                }
            } else {
                curr[col] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
        best_i -= 1;
        best_j -= 1;
        best += 1;
    }
    while best_i + best < ahi && best_j + best < bhi && a[best_i + best] == b[best_j + best] {
        best += 1;
    }
    (best_i, best_j, best)
}
