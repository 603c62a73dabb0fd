//! Quantile estimation for `TDigest`.
//!
//! Each centroid covers the cumulative-weight interval `[prefix, prefix + w)`.
//! The target rank `q·N` selects the first centroid whose interval contains it:
//!
//! - **Edge centroids** (first or last) answer with their mean.
//! - **Interior centroids** interpolate linearly across half the distance
//!   between their neighbours' means, centred on their own mean:
//!   `mean + ((target − prefix)/w − 0.5) · (succ − pred)/2`.
//! - A target past every interval (only `q = 1` with rounding) answers with
//!   the largest mean.
//!
//! Results are clamped to `[min mean, max mean]`; interpolation around a
//! lopsided neighbourhood can otherwise overshoot the observed range.
//!
//! # Edge cases
//! - **Empty digest** → `NaN`.
//! - **Single centroid** → its mean, for every `q`.
//! - `q` outside `[0, 1]` (or NaN) → panic in [`TDigest::quantile`], error in
//!   [`TDigest::try_quantile`].

use rayon::prelude::*;

use crate::tdigest::summary::Summary;
use crate::tdigest::TDigest;
use crate::{TdError, TdResult};

/// Batch size from which [`TDigest::quantiles`] fans out over Rayon.
const PAR_MIN: usize = 1_024;

impl<R> TDigest<R> {
    /// Estimate the value below which a fraction `q` of the weight lies.
    ///
    /// # Panics
    /// If `q` is not within `[0, 1]`. Use [`TDigest::try_quantile`] for a
    /// checked variant.
    pub fn quantile(&self, q: f64) -> f64 {
        assert!(
            (0.0..=1.0).contains(&q),
            "tdigest: quantile must be within [0, 1] (got {q})"
        );
        quantile_kernel(self.summary(), self.total_weight(), q)
    }

    /// Checked [`TDigest::quantile`].
    pub fn try_quantile(&self, q: f64) -> TdResult<f64> {
        if !(0.0..=1.0).contains(&q) {
            return Err(TdError::InvalidQuantile { q });
        }
        Ok(quantile_kernel(self.summary(), self.total_weight(), q))
    }

    /// Evaluate many quantiles at once; large batches run in parallel.
    ///
    /// # Panics
    /// If any probe is outside `[0, 1]`.
    pub fn quantiles(&self, qs: &[f64]) -> Vec<f64>
    where
        R: Sync,
    {
        if qs.len() >= PAR_MIN {
            qs.par_iter()
                .with_min_len(256)
                .map(|&q| self.quantile(q))
                .collect()
        } else {
            qs.iter().map(|&q| self.quantile(q)).collect()
        }
    }
}

fn quantile_kernel(summary: &Summary, total_weight: u32, q: f64) -> f64 {
    let (lo, hi) = match (summary.min(), summary.max()) {
        (Some(lo), Some(hi)) => (lo.mean(), hi.mean()),
        _ => return f64::NAN,
    };
    if summary.len() == 1 {
        return lo;
    }

    let target = q * f64::from(total_weight);
    let last = summary.len() - 1;
    let mut prefix = 0.0;
    for (i, c) in summary.iter().enumerate() {
        let w = f64::from(c.weight());
        if target < prefix + w {
            if i == 0 || i == last {
                return c.mean();
            }
            let (Some(succ), Some(pred)) = summary.successor_and_predecessor(c.mean()) else {
                return c.mean();
            };
            // Halve first so neighbours near ±f64::MAX cannot overflow.
            let half_span = succ.mean() / 2.0 - pred.mean() / 2.0;
            let est = c.mean() + ((target - prefix) / w - 0.5) * half_span;
            return est.clamp(lo, hi);
        }
        prefix += w;
    }
    hi
}

#[cfg(test)]
mod tests {
    use crate::tdigest::test_helpers::*;
    use crate::tdigest::TDigest;
    use crate::TdError;

    fn digest_of(values: &[f64], compression: f64) -> TDigest {
        let mut d = TDigest::with_seed(compression, 11).expect("digest");
        for &v in values {
            d.insert(v).expect("insert");
        }
        d
    }

    #[test]
    fn empty_digest_is_nan() {
        let d = TDigest::with_seed(100.0, 1).expect("digest");
        assert!(d.quantile(0.5).is_nan());
        assert!(d.try_quantile(0.0).expect("in range").is_nan());
    }

    #[test]
    fn single_centroid_answers_its_mean() {
        let d = digest_of(&[0.4], 100.0);
        for q in [0.0, 0.1, 0.5, 1.0] {
            assert_exact("single", 0.4, d.quantile(q));
        }
    }

    #[test]
    fn median_of_small_integer_stream() {
        let d = digest_of(&[1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 3.0], 100.0);
        assert_exact("median", 2.0, d.quantile(0.5));
        assert_exact("q=0", 1.0, d.quantile(0.0));
        assert_exact("q=1", 3.0, d.quantile(1.0));
    }

    #[test]
    fn midrank_is_exact_under_capacity() {
        let values: Vec<f64> = (0..11).map(f64::from).collect();
        let d = digest_of(&values, 100.0);
        assert_eq!(d.centroid_count(), values.len());
        let n = values.len() as f64;
        for (i, &v) in values.iter().enumerate() {
            let q = (i as f64 + 0.5) / n;
            assert_rel_close(&format!("midrank {i}"), v, d.quantile(q), 1e-9);
        }
    }

    #[test]
    fn estimates_stay_within_observed_range() {
        let d = digest_of(&[0.0, 279.0, 2.0, 281.0], 10.0);
        let (lo, hi) = (0.0, 281.0);
        let mut q = 0.0;
        while q <= 1.0 {
            let v = d.quantile(q);
            assert!(v >= lo && v <= hi, "q={q}: {v}");
            q += 0.01;
        }
    }

    #[test]
    fn neighbours_near_f64_limits_stay_finite() {
        let d = digest_of(&[-1e308, 0.0, 1e308], 100.0);
        assert_eq!(d.centroid_count(), 3);
        assert_exact("median", 0.0, d.quantile(0.5));
        for i in 0..=100 {
            let q = f64::from(i) / 100.0;
            let v = d.quantile(q);
            assert!((-1e308..=1e308).contains(&v), "q={q}: {v}");
        }
    }

    #[test]
    fn evenly_spaced_singletons_give_monotone_estimates() {
        let values: Vec<f64> = (0..150u32).map(|i| f64::from((i * 53) % 150)).collect();
        let d = digest_of(&values, 100.0);
        assert_eq!(d.centroid_count(), 150);
        let qs: Vec<f64> = (0..=200).map(|i| f64::from(i) / 200.0).collect();
        assert_monotone_chain("quantiles", &d.quantiles(&qs));
    }

    #[test]
    fn singleton_in_a_crowd() {
        let mut d = TDigest::with_seed(100.0, 3).expect("digest");
        for _ in 0..10_000 {
            d.insert(10.0).expect("insert");
        }
        d.insert(20.0).expect("insert");
        d.compress().expect("compress");

        for i in 0..100 {
            let q = f64::from(i) / 100.0;
            assert_exact(&format!("q={q}"), 10.0, d.quantile(q));
        }
        assert_exact("q=1", 20.0, d.quantile(1.0));
    }

    #[test]
    fn sequential_insertion_tracks_exact_quantiles() {
        let mut d = TDigest::with_seed(100.0, 21).expect("digest");
        // (q, tolerance growth per sample seen)
        let probes = [
            (0.001, 0.001),
            (0.01, 0.005),
            (0.05, 0.01),
            (0.25, 0.03),
            (0.5, 0.03),
            (0.75, 0.03),
            (0.95, 0.01),
            (0.99, 0.005),
            (0.999, 0.001),
        ];
        for i in 0..10_000u32 {
            d.insert(f64::from(i)).expect("insert");
            if i % 97 != 0 {
                continue;
            }
            let seen: Vec<f64> = (0..=i).map(f64::from).collect();
            for &(q, slope) in &probes {
                let exact = exact_quantile(&seen, q);
                let got = d.quantile(q);
                let tol = 1.0 + slope * f64::from(i);
                assert!(
                    (got - exact).abs() < tol,
                    "i={i} q={q}: got {got}, exact {exact}, tol {tol}"
                );
            }
        }
    }

    #[test]
    fn checked_variant_reports_out_of_range() {
        let d = digest_of(&[1.0, 2.0], 100.0);
        assert_eq!(d.try_quantile(1.5), Err(TdError::InvalidQuantile { q: 1.5 }));
        assert!(d.try_quantile(-0.1).is_err());
        assert!(d.try_quantile(f64::NAN).is_err());
        assert_exact("in range", 1.0, d.try_quantile(0.0).expect("ok"));
    }

    #[test]
    #[should_panic(expected = "quantile must be within [0, 1]")]
    fn quantile_above_one_panics() {
        let d = digest_of(&[1.0], 100.0);
        d.quantile(1.01);
    }

    #[test]
    #[should_panic(expected = "quantile must be within [0, 1]")]
    fn negative_quantile_panics() {
        let d = digest_of(&[1.0], 100.0);
        d.quantile(-0.5);
    }

    #[test]
    fn parallel_batch_matches_scalar() {
        let values: Vec<f64> = (0..2_000u32).map(|i| f64::from(i % 313)).collect();
        let d = digest_of(&values, 100.0);
        let qs: Vec<f64> = (0..4_096).map(|i| f64::from(i) / 4_095.0).collect();
        let batch = d.quantiles(&qs);
        for (q, got) in qs.iter().zip(&batch) {
            assert_exact("batch", d.quantile(*q), *got);
        }
    }
}
