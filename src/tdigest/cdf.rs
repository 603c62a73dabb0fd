//! CDF estimation for `TDigest`.
//!
//! Each centroid is spread uniformly over `[mean − left, mean + right]`, where
//! `left`/`right` are half the gaps to its neighbours (the edge centroids reuse
//! their single gap on the open side). The estimate at `x` is the weight of
//! every centroid whose span ends at or below `x`, plus the covered fraction of
//! the centroid whose span contains `x`, over the total weight.
//!
//! For a unit-weight centroid this puts exactly half its weight at its mean,
//! which matches a rank defined as the average of the strict (`< x`) and
//! non-strict (`<= x`) counts.
//!
//! # Edge cases
//! - **Empty digest** → `NaN`.
//! - **NaN probe** → `NaN`.
//! - **Single centroid** → `0` below its mean, `1` at or above it.
//! - Results are clamped to `[0, 1]`.

use rayon::prelude::*;

use crate::tdigest::summary::Summary;
use crate::tdigest::TDigest;

/// Crossover for parallel evaluation with Rayon.
const PAR_MIN: usize = 1_024;

impl<R> TDigest<R> {
    /// Estimated fraction of the weight at or below `x`.
    pub fn cdf(&self, x: f64) -> f64 {
        cdf_kernel(self.summary(), self.total_weight(), x)
    }

    /// [`TDigest::cdf`] for every probe; large batches run in parallel.
    pub fn cdf_many(&self, xs: &[f64]) -> Vec<f64>
    where
        R: Sync,
    {
        if xs.len() >= PAR_MIN {
            xs.par_iter()
                .with_min_len(256)
                .map(|&x| self.cdf(x))
                .collect()
        } else {
            xs.iter().map(|&x| self.cdf(x)).collect()
        }
    }
}

fn cdf_kernel(summary: &Summary, total_weight: u32, x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let (first, second) = match (summary.at(0), summary.at(1)) {
        (None, _) => return f64::NAN,
        (Some(only), None) => return if x < only.mean() { 0.0 } else { 1.0 },
        (Some(a), Some(b)) => (a, b),
    };

    let n = f64::from(total_weight);
    let mut left = second.mean() / 2.0 - first.mean() / 2.0;
    let mut right = left;
    let mut below = 0.0;
    for (i, c) in summary.iter().enumerate() {
        let mean = c.mean();
        if let Some(next) = summary.at(i + 1) {
            right = next.mean() / 2.0 - mean / 2.0;
        }
        if x < mean + right {
            let lo = mean - left;
            let hi = mean + right;
            let covered = f64::from(c.weight()) * (x - lo) / (hi - lo);
            return ((below + covered) / n).clamp(0.0, 1.0);
        }
        below += f64::from(c.weight());
        left = right;
    }
    1.0
}
