//! MinHash sketching over shingle sets.
//!
//! Each slot simulates one random permutation of the shingle universe by
//! re-mixing the shingle hashes with a slot-specific key derived from the
//! family seed. The slot value is the minimum over the set.

use rayon::prelude::*;
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::config::PerceptualConfig;
use crate::shingles::{shingle_hashes, ShingleSet};
use crate::signature::Signature;

/// Sketch a shingle set into a `cfg.num_perm`-slot signature.
///
/// An empty set yields `u64::MAX` in every slot. Parallel and sequential
/// computation produce the same values.
pub fn sketch(shingles: &ShingleSet, cfg: &PerceptualConfig) -> Signature {
    let hashes = shingle_hashes(shingles, cfg.seed);
    Signature::from_values(minhash_values(&hashes, cfg.num_perm, cfg))
}

pub(crate) fn minhash_values(unique_hashes: &[u64], m: usize, cfg: &PerceptualConfig) -> Vec<u64> {
    if m == 0 {
        return Vec::new();
    }

    if unique_hashes.is_empty() {
        return vec![u64::MAX; m];
    }

    let mut result = Vec::with_capacity(m);

    if cfg.use_parallel {
        (0..m)
            .into_par_iter()
            .map(|j| compute_slot(unique_hashes, j, cfg.seed))
            .collect_into_vec(&mut result);
    } else {
        result.extend((0..m).map(|j| compute_slot(unique_hashes, j, cfg.seed)));
    }

    result
}

/// Minimum over the set of the `j`-th hash function.
#[inline]
pub(crate) fn compute_slot(unique_hashes: &[u64], j: usize, seed: u64) -> u64 {
    let step = (j as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let key = splitmix64(seed.wrapping_add(step));
    unique_hashes
        .iter()
        .map(|&val| mix_u64(val, key))
        .min()
        .unwrap_or(u64::MAX)
}

/// Re-hash `x` under `key` with an fmix64 finaliser.
#[inline]
pub(crate) fn mix_u64(x: u64, key: u64) -> u64 {
    let mut h = xxh3_64_with_seed(&x.to_le_bytes(), key);
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51afd7ed558ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ceb9fe1a85ec53);
    h ^ (h >> 33)
}

#[inline]
pub(crate) fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shingles::{extract_shingles, jaccard};

    fn words(prefix: &str, n: usize) -> String {
        (0..n)
            .map(|i| format!("{prefix}{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn empty_set_is_all_max() {
        let sig = sketch(&ShingleSet::new(), &PerceptualConfig::default());
        assert_eq!(sig.len(), 128);
        assert!(sig.values().iter().all(|&v| v == u64::MAX));
        assert!(sig.is_empty_set());
    }

    #[test]
    fn zero_slots_is_empty() {
        assert!(minhash_values(&[1, 2, 3], 0, &PerceptualConfig::default()).is_empty());
    }

    #[test]
    fn signature_length_follows_num_perm() {
        let set = extract_shingles("a b c d e f", 3);
        for m in [1, 16, 64, 128, 256] {
            let cfg = PerceptualConfig::default().with_num_perm(m);
            assert_eq!(sketch(&set, &cfg).len(), m);
        }
    }

    #[test]
    fn deterministic_for_fixed_seed() {
        let set = extract_shingles(&words("w", 40), 3);
        let cfg = PerceptualConfig::default();
        assert_eq!(sketch(&set, &cfg), sketch(&set, &cfg));
    }

    #[test]
    fn different_seeds_differ() {
        let set = extract_shingles(&words("w", 40), 3);
        let a = sketch(&set, &PerceptualConfig::default().with_seed(12345));
        let b = sketch(&set, &PerceptualConfig::default().with_seed(54321));
        assert_ne!(a, b);
    }

    #[test]
    fn parallel_equals_sequential() {
        let set = extract_shingles(&words("tok", 200), 3);
        let seq = sketch(&set, &PerceptualConfig::default().with_parallel(false));
        let par = sketch(&set, &PerceptualConfig::default().with_parallel(true));
        assert_eq!(seq, par);
    }

    #[test]
    fn identical_sets_agree_everywhere() {
        let text = words("x", 30);
        let a = sketch(&extract_shingles(&text, 3), &PerceptualConfig::default());
        let b = sketch(&extract_shingles(&text.to_uppercase(), 3), &PerceptualConfig::default());
        assert_eq!(a.estimate_similarity(&b), 1.0);
    }

    #[test]
    fn estimate_tracks_exact_jaccard() {
        // 100 words, second copy has its last 20 words replaced.
        let base = words("w", 100);
        let mut tail: Vec<String> = (0..80).map(|i| format!("w{i}")).collect();
        tail.extend((0..20).map(|i| format!("z{i}")));
        let other = tail.join(" ");

        let a = extract_shingles(&base, 3);
        let b = extract_shingles(&other, 3);
        let exact = jaccard(&a, &b);

        let cfg = PerceptualConfig::default();
        let estimate = sketch(&a, &cfg).estimate_similarity(&sketch(&b, &cfg));
        // Standard error at 128 slots is ~0.044; allow 5 sigma.
        assert!(
            (estimate - exact).abs() < 0.22,
            "estimate {estimate} too far from exact {exact}"
        );
    }

    #[test]
    fn disjoint_sets_rarely_agree() {
        let cfg = PerceptualConfig::default();
        let a = sketch(&extract_shingles(&words("left", 50), 3), &cfg);
        let b = sketch(&extract_shingles(&words("right", 50), 3), &cfg);
        assert!(a.estimate_similarity(&b) < 0.05);
    }

    #[test]
    fn compute_slot_deterministic_and_keyed() {
        let hashes = [1u64, 2, 3, 4, 5];
        assert_eq!(compute_slot(&hashes, 5, 42), compute_slot(&hashes, 5, 42));
        assert_ne!(compute_slot(&hashes, 0, 42), compute_slot(&hashes, 1, 42));
    }

    #[test]
    fn mix_u64_depends_on_key_and_input() {
        assert_eq!(mix_u64(12345, 42), mix_u64(12345, 42));
        assert_ne!(mix_u64(12345, 1), mix_u64(12345, 2));
        assert_ne!(mix_u64(100, 42), mix_u64(200, 42));
    }

    #[test]
    fn splitmix64_avalanche_effect() {
        let diff_bits = (splitmix64(1000) ^ splitmix64(1001)).count_ones();
        assert!(diff_bits > 16);
    }

    #[test]
    fn splitmix64_unique_for_small_inputs() {
        let unique: std::collections::HashSet<u64> = (0..100u64).map(splitmix64).collect();
        assert_eq!(unique.len(), 100);
    }
}
