use serde::{Deserialize, Serialize};

/// A fixed-length MinHash signature.
///
/// Slot `j` holds the minimum of hash function `j` over the document's
/// shingle set. The fraction of equal slots between two signatures estimates
/// the Jaccard similarity of the underlying sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    values: Vec<u64>,
}

impl Signature {
    pub fn from_values(values: Vec<u64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when the signature was computed from an empty shingle set.
    pub fn is_empty_set(&self) -> bool {
        self.values.iter().all(|&v| v == u64::MAX)
    }

    /// The `rows` slots of band `band`, or `None` past the end.
    pub fn band(&self, band: usize, rows: usize) -> Option<&[u64]> {
        let start = band.checked_mul(rows)?;
        let end = start.checked_add(rows)?;
        self.values.get(start..end)
    }

    /// Fraction of slots on which both signatures agree.
    ///
    /// Signatures of different lengths were produced under different configs
    /// and never compare as similar.
    pub fn estimate_similarity(&self, other: &Signature) -> f64 {
        if self.values.len() != other.values.len() || self.values.is_empty() {
            return 0.0;
        }
        let matches = self
            .values
            .iter()
            .zip(&other.values)
            .filter(|(a, b)| a == b)
            .count();
        matches as f64 / self.values.len() as f64
    }
}
