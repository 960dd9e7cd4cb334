use hashbrown::{HashMap, HashSet};
use perceptual::Signature;
use xxhash_rust::xxh3::Xxh3;

use crate::params::LshParams;
use crate::IndexError;

/// A candidate whose cached signature agrees with the probe on at least the
/// requested fraction of slots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarMatch<'a, K> {
    pub key: &'a K,
    pub similarity: f64,
}

/// Banded LSH index with a signature cache.
///
/// Entries are stored in insertion order; every band bucket holds entry
/// positions, so candidate lists come back in the order keys were inserted.
#[derive(Debug, Clone)]
pub struct BandedIndex<K> {
    params: LshParams,
    buckets: Vec<HashMap<u64, Vec<usize>>>,
    entries: Vec<(K, Signature)>,
}

impl<K> BandedIndex<K> {
    pub fn new(params: LshParams) -> Result<Self, IndexError> {
        params.validate()?;
        Ok(Self {
            params,
            buckets: (0..params.bands).map(|_| HashMap::new()).collect(),
            entries: Vec::new(),
        })
    }

    pub fn params(&self) -> &LshParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add `key` to the bucket of each of its bands and cache its signature.
    ///
    /// A signature that does not have exactly `num_perm` slots would fill
    /// only some bands and is refused.
    pub fn insert(&mut self, key: K, signature: Signature) -> Result<(), IndexError> {
        if signature.len() != self.params.num_perm {
            return Err(IndexError::SignatureLength {
                expected: self.params.num_perm,
                actual: signature.len(),
            });
        }
        let slot = self.entries.len();
        for (band, hash) in self.band_hashes(&signature) {
            self.buckets[band].entry(hash).or_default().push(slot);
        }
        self.entries.push((key, signature));
        Ok(())
    }

    /// True iff `signature` shares at least one band bucket with an
    /// inserted entry. Looks at exactly one bucket per band.
    pub fn query(&self, signature: &Signature) -> bool {
        self.band_hashes(signature)
            .any(|(band, hash)| self.buckets[band].contains_key(&hash))
    }

    /// The earliest-inserted key sharing a bucket with `signature`.
    ///
    /// Buckets list entries in insertion order, so this is the smallest
    /// bucket head over the bands and needs no candidate list.
    pub fn first_candidate(&self, signature: &Signature) -> Option<&K> {
        self.band_hashes(signature)
            .filter_map(|(band, hash)| self.buckets[band].get(&hash)?.first().copied())
            .min()
            .map(|slot| &self.entries[slot].0)
    }

    /// Distinct keys sharing a bucket with `signature`, in insertion order.
    pub fn candidates(&self, signature: &Signature) -> Vec<&K> {
        self.candidate_slots(signature)
            .into_iter()
            .map(|slot| &self.entries[slot].0)
            .collect()
    }

    /// The earliest-inserted candidate whose full signature agreement with
    /// `signature` is at least `threshold`.
    pub fn similar(&self, signature: &Signature, threshold: f64) -> Option<SimilarMatch<'_, K>> {
        self.candidate_slots(signature).into_iter().find_map(|slot| {
            let (key, cached) = &self.entries[slot];
            let similarity = signature.estimate_similarity(cached);
            (similarity >= threshold).then_some(SimilarMatch { key, similarity })
        })
    }

    fn candidate_slots(&self, signature: &Signature) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut slots: Vec<usize> = self
            .band_hashes(signature)
            .filter_map(|(band, hash)| self.buckets[band].get(&hash))
            .flatten()
            .copied()
            .filter(|slot| seen.insert(*slot))
            .collect();
        slots.sort_unstable();
        slots
    }

    fn band_hashes<'s>(&self, signature: &'s Signature) -> impl Iterator<Item = (usize, u64)> + 's {
        let rows = self.params.rows_per_band;
        (0..self.params.bands).filter_map(move |band| {
            signature
                .band(band, rows)
                .map(|values| (band, band_hash(values, band)))
        })
    }
}

/// Hash one band's slots, seeded with the band index so equal slot values in
/// different bands land in unrelated buckets.
fn band_hash(values: &[u64], band: usize) -> u64 {
    let mut hasher = Xxh3::with_seed(band as u64);
    for v in values {
        hasher.update(&v.to_le_bytes());
    }
    hasher.digest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use perceptual::{extract_shingles, sketch, PerceptualConfig};

    fn sig(text: &str) -> Signature {
        let cfg = PerceptualConfig::default();
        sketch(&extract_shingles(text, cfg.k), &cfg)
    }

    fn words(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    #[test]
    fn rejects_invalid_params() {
        let bad = LshParams {
            num_perm: 128,
            bands: 10,
            rows_per_band: 10,
        };
        assert!(BandedIndex::<u32>::new(bad).is_err());
    }

    #[test]
    fn empty_index_has_no_candidates() {
        let index = BandedIndex::<u32>::new(LshParams::default()).unwrap();
        let probe = sig("the quick brown fox jumps over the lazy dog");
        assert!(!index.query(&probe));
        assert!(index.candidates(&probe).is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn identical_signature_is_found() {
        let mut index = BandedIndex::new(LshParams::default()).unwrap();
        let text = "the quick brown fox jumps over the lazy dog";
        index.insert("a", sig(text)).unwrap();
        assert!(index.query(&sig(text)));
        assert_eq!(index.candidates(&sig(text)), vec![&"a"]);
        let hit = index.similar(&sig(text), 0.99).unwrap();
        assert_eq!(*hit.key, "a");
        assert_eq!(hit.similarity, 1.0);
    }

    #[test]
    fn disjoint_text_is_not_a_candidate() {
        let mut index = BandedIndex::new(LshParams::default()).unwrap();
        index.insert(1, sig(&words("left", 40).join(" "))).unwrap();
        let probe = sig(&words("right", 40).join(" "));
        assert!(!index.query(&probe));
        assert!(index.similar(&probe, 0.1).is_none());
    }

    #[test]
    fn candidates_come_back_in_insertion_order_without_repeats() {
        let mut index = BandedIndex::new(LshParams::default()).unwrap();
        let text = words("w", 30).join(" ");
        for key in [3, 1, 2] {
            index.insert(key, sig(&text)).unwrap();
        }
        assert_eq!(index.candidates(&sig(&text)), vec![&3, &1, &2]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn similar_applies_threshold_to_full_signature() {
        let mut index = BandedIndex::new(LshParams::default()).unwrap();
        let base = words("w", 60);
        index.insert("base", sig(&base.join(" "))).unwrap();

        let mut near = base.clone();
        near[59] = "changed".to_string();
        let probe = sig(&near.join(" "));
        assert!(index.similar(&probe, 0.6).is_some());
        assert!(index.similar(&probe, 1.01).is_none());
    }

    #[test]
    fn band_hash_depends_on_band_index() {
        assert_ne!(band_hash(&[1, 2, 3, 4], 0), band_hash(&[1, 2, 3, 4], 1));
        assert_eq!(band_hash(&[1, 2, 3, 4], 7), band_hash(&[1, 2, 3, 4], 7));
    }

    #[test]
    fn band_hash_matches_one_shot_over_slot_bytes() {
        let values = [1u64, u64::MAX, 42, 7];
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        assert_eq!(
            band_hash(&values, 3),
            xxhash_rust::xxh3::xxh3_64_with_seed(&bytes, 3)
        );
    }

    #[test]
    fn short_signature_is_refused() {
        let mut index = BandedIndex::new(LshParams::default()).unwrap();
        let short = Signature::from_values(vec![1; 64]);
        assert_eq!(
            index.insert("short", short),
            Err(IndexError::SignatureLength {
                expected: 128,
                actual: 64
            })
        );
        assert!(index.is_empty());
        assert!(index.buckets.iter().all(|bucket| bucket.is_empty()));
    }

    #[test]
    fn first_candidate_is_earliest_inserted() {
        let mut index = BandedIndex::new(LshParams::default()).unwrap();
        assert_eq!(index.first_candidate(&sig(&words("w", 30).join(" "))), None);

        let text = words("w", 30).join(" ");
        index.insert("other", sig(&words("x", 30).join(" "))).unwrap();
        for key in ["third", "first", "second"] {
            index.insert(key, sig(&text)).unwrap();
        }
        assert_eq!(index.first_candidate(&sig(&text)), Some(&"third"));
        assert_eq!(
            index.first_candidate(&sig(&text)),
            index.candidates(&sig(&text)).first().copied()
        );
    }
}
