//! Word shingling.
//!
//! A shingle is a run of `k` consecutive lower-cased words joined by a single
//! space. A document is represented by the *set* of its shingles, so word
//! order matters only within a window and repeated phrases count once.

use std::collections::HashSet;

use xxhash_rust::xxh3::xxh3_64_with_seed;

/// The set of distinct shingles of one document.
pub type ShingleSet = HashSet<String>;

/// Extract the set of `k`-word shingles from `text`.
///
/// Words are whitespace-separated and lower-cased. Text with fewer than `k`
/// words (or `k == 0`) yields an empty set.
pub fn extract_shingles(text: &str, k: usize) -> ShingleSet {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    if k == 0 || words.len() < k {
        return ShingleSet::new();
    }
    words.windows(k).map(|window| window.join(" ")).collect()
}

/// Hash every shingle once with the family seed.
///
/// The result is sorted and deduplicated so that the slot computation sees a
/// stable input independent of set iteration order.
pub(crate) fn shingle_hashes(shingles: &ShingleSet, seed: u64) -> Vec<u64> {
    let mut hashes: Vec<u64> = shingles
        .iter()
        .map(|s| xxh3_64_with_seed(s.as_bytes(), seed))
        .collect();
    hashes.sort_unstable();
    hashes.dedup();
    hashes
}

/// Exact Jaccard similarity `|A ∩ B| / |A ∪ B|`.
///
/// Two empty sets are reported as 0.0: there is nothing to be similar about.
pub fn jaccard(a: &ShingleSet, b: &ShingleSet) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}
