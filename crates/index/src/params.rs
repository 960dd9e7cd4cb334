//! Banding parameters and the threshold-driven parameter search.

use serde::{Deserialize, Serialize};

use crate::IndexError;

/// Integration steps used when scoring a `(bands, rows)` pair.
const INTEGRATION_STEPS: usize = 1000;

/// How a `num_perm`-slot signature is cut into bands.
///
/// Two signatures become candidates when they agree on every row of at least
/// one band. For true Jaccard similarity `s` this happens with probability
/// `1 - (1 - s^rows)^bands`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LshParams {
    pub num_perm: usize,
    pub bands: usize,
    pub rows_per_band: usize,
}

/// 16 bands of 8 rows over 128 slots: what [`LshParams::for_threshold`]
/// picks for a 0.7 similarity threshold.
impl Default for LshParams {
    fn default() -> Self {
        Self {
            num_perm: 128,
            bands: 16,
            rows_per_band: 8,
        }
    }
}

impl LshParams {
    pub fn new(bands: usize, rows_per_band: usize) -> Self {
        Self {
            num_perm: bands * rows_per_band,
            bands,
            rows_per_band,
        }
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        if self.bands == 0 || self.rows_per_band == 0 {
            return Err(IndexError::EmptyBanding {
                bands: self.bands,
                rows: self.rows_per_band,
            });
        }
        if self.bands * self.rows_per_band != self.num_perm {
            return Err(IndexError::BandingMismatch {
                bands: self.bands,
                rows: self.rows_per_band,
                num_perm: self.num_perm,
            });
        }
        Ok(())
    }

    /// Probability that a pair with Jaccard similarity `s` collides in at
    /// least one band.
    pub fn candidate_probability(&self, s: f64) -> f64 {
        let s = s.clamp(0.0, 1.0);
        1.0 - (1.0 - s.powi(self.rows_per_band as i32)).powi(self.bands as i32)
    }

    /// Similarity at which the collision curve is steepest, `(1/b)^(1/r)`.
    pub fn threshold_estimate(&self) -> f64 {
        (1.0 / self.bands as f64).powf(1.0 / self.rows_per_band as f64)
    }

    /// Pick the divisor pair of `num_perm` whose collision curve best
    /// separates pairs above and below `threshold`.
    ///
    /// Scores every `(b, r)` with `b * r == num_perm` by the equally
    /// weighted false-positive area below the threshold plus the
    /// false-negative area above it, and keeps the minimum.
    pub fn for_threshold(threshold: f64, num_perm: usize) -> Result<Self, IndexError> {
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(IndexError::InvalidThreshold { threshold });
        }
        if num_perm == 0 {
            return Err(IndexError::EmptyBanding { bands: 0, rows: 0 });
        }

        let mut best: Option<(f64, LshParams)> = None;
        for bands in (1..=num_perm).filter(|b| num_perm % b == 0) {
            let params = LshParams::new(bands, num_perm / bands);
            let false_positive = integrate(|s| params.candidate_probability(s), 0.0, threshold);
            let false_negative =
                integrate(|s| 1.0 - params.candidate_probability(s), threshold, 1.0);
            let error = 0.5 * false_positive + 0.5 * false_negative;
            if best.map_or(true, |(e, _)| error < e) {
                best = Some((error, params));
            }
        }
        best.map(|(_, params)| params)
            .ok_or(IndexError::EmptyBanding { bands: 0, rows: 0 })
    }
}

/// Midpoint-rule integral of `f` over `[a, b]`.
fn integrate(f: impl Fn(f64) -> f64, a: f64, b: f64) -> f64 {
    let step = (b - a) / INTEGRATION_STEPS as f64;
    (0..INTEGRATION_STEPS)
        .map(|i| f(a + (i as f64 + 0.5) * step))
        .sum::<f64>()
        * step
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_16_bands_of_8() {
        let p = LshParams::default();
        assert_eq!((p.num_perm, p.bands, p.rows_per_band), (128, 16, 8));
        assert!(p.validate().is_ok());
        assert_eq!(p, LshParams::for_threshold(0.7, 128).unwrap());
    }

    #[test]
    fn validate_rejects_mismatch() {
        let p = LshParams {
            num_perm: 128,
            bands: 14,
            rows_per_band: 9,
        };
        assert_eq!(
            p.validate(),
            Err(IndexError::BandingMismatch {
                bands: 14,
                rows: 9,
                num_perm: 128
            })
        );
    }

    #[test]
    fn validate_rejects_zero() {
        assert!(LshParams::new(0, 4).validate().is_err());
        assert!(LshParams::new(4, 0).validate().is_err());
    }

    #[test]
    fn collision_curve_is_monotone() {
        let p = LshParams::default();
        assert_eq!(p.candidate_probability(0.0), 0.0);
        assert_eq!(p.candidate_probability(1.0), 1.0);
        let mut last = 0.0;
        for i in 1..=20 {
            let prob = p.candidate_probability(i as f64 / 20.0);
            assert!(prob >= last);
            last = prob;
        }
    }

    #[test]
    fn default_banding_separates_around_the_threshold() {
        let p = LshParams::default();
        assert!(p.candidate_probability(0.9) > 0.999);
        assert!(p.candidate_probability(0.5) < 0.1);
        assert!(p.candidate_probability(0.1) < 1e-6);
    }

    #[test]
    fn threshold_estimate_of_default() {
        let t = LshParams::default().threshold_estimate();
        assert!((t - (1.0f64 / 16.0).powf(0.125)).abs() < 1e-12);
    }

    #[test]
    fn for_threshold_picks_known_pairs() {
        assert_eq!(
            LshParams::for_threshold(0.5, 128).unwrap(),
            LshParams::new(32, 4)
        );
        assert_eq!(
            LshParams::for_threshold(0.7, 128).unwrap(),
            LshParams::new(16, 8)
        );
        assert_eq!(
            LshParams::for_threshold(0.9, 128).unwrap(),
            LshParams::new(4, 32)
        );
    }

    #[test]
    fn for_threshold_always_tiles_the_signature() {
        for t in [0.2, 0.4, 0.6, 0.8] {
            let p = LshParams::for_threshold(t, 120).unwrap();
            assert_eq!(p.bands * p.rows_per_band, 120);
            assert!(p.validate().is_ok());
        }
    }

    #[test]
    fn for_threshold_rejects_out_of_range() {
        assert!(LshParams::for_threshold(0.0, 128).is_err());
        assert!(LshParams::for_threshold(1.0, 128).is_err());
        assert!(LshParams::for_threshold(f64::NAN, 128).is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let p: LshParams = serde_json::from_str(r#"{"bands": 16}"#).unwrap();
        assert_eq!(p, LshParams::default());
    }
}
