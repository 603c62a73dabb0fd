use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A centroid summarizes a cluster of samples: their weighted mean and how many
/// samples (by weight) were folded into it.
///
/// Centroids handed out by the digest are copies. They stay meaningful only
/// until the next mutation of the digest.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Centroid {
    mean: OrderedFloat<f64>,
    weight: u32,
}

impl PartialOrd for Centroid {
    fn partial_cmp(&self, other: &Centroid) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Centroid {
    fn cmp(&self, other: &Centroid) -> Ordering {
        // The store never holds two centroids with the same mean.
        self.mean.cmp(&other.mean)
    }
}

impl Centroid {
    #[inline]
    pub fn new(mean: f64, weight: u32) -> Self {
        debug_assert!(!mean.is_nan());
        debug_assert!(weight > 0);
        Centroid {
            mean: OrderedFloat::from(mean),
            weight,
        }
    }

    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean.into_inner()
    }
    #[inline]
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Fold `weight` samples located at `value` into this centroid using the
    /// incremental weighted mean `m' = m + w·(x − m)/(W + w)`.
    #[inline]
    pub fn update(&mut self, value: f64, weight: u32) {
        self.weight += weight;
        let m = self.mean.into_inner();
        let m = m + f64::from(weight) * (value - m) / f64::from(self.weight);
        self.mean = OrderedFloat::from(m);
    }
}

/// Strictly increasing by mean.
#[inline]
pub fn is_sorted_strict_by_mean(cs: &[Centroid]) -> bool {
    cs.windows(2).all(|w| w[0].mean() < w[1].mean())
}
