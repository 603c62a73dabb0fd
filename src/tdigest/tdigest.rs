// src/tdigest/tdigest.rs
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::tdigest::centroids::{is_sorted_strict_by_mean, Centroid};
use crate::tdigest::random::{pick_index, shuffle, DefaultRng};
use crate::tdigest::scale::threshold;
use crate::tdigest::summary::Summary;
use crate::{TdError, TdResult};

/// Compression used when the caller does not pick one.
pub const DEFAULT_COMPRESSION: f64 = 100.0;

/// Centroid count (relative to compression) that triggers an automatic compress.
const AUTO_COMPRESS_FACTOR: f64 = 20.0;
/// Initial store capacity relative to compression.
const CAPACITY_FACTOR: f64 = 10.0;
/// Upper bound on the up-front reservation; the store grows past it on demand.
const MAX_INITIAL_CAPACITY: usize = 1 << 16;

#[inline]
fn initial_capacity(compression: f64) -> usize {
    ((compression * CAPACITY_FACTOR) as usize).min(MAX_INITIAL_CAPACITY)
}

fn validate_compression(compression: f64) -> TdResult<f64> {
    if compression.is_finite() && compression > 0.0 {
        Ok(compression)
    } else {
        Err(TdError::InvalidCompression { value: compression })
    }
}

/// Streaming t-digest: an online sketch of a distribution answering quantile
/// and CDF queries with high accuracy near the tails.
///
/// - Samples go through [`TDigest::insert`] / [`TDigest::insert_weighted`].
/// - Centroids live in an ordered store with an order-statistics index, so each
///   insertion costs a couple of logarithmic lookups plus a local reorder.
/// - When the number of centroids exceeds `20 × compression` the digest
///   compresses itself by replaying its centroids in random order.
///
/// `R` drives the tie-break between equidistant centroids and the replay
/// shuffle. Use [`TDigest::with_seed`] for reproducible digests.
#[derive(Debug, Clone)]
pub struct TDigest<R = DefaultRng> {
    summary: Summary,
    compression: f64,
    count: u32,
    rng: R,
}

/* =============================================================================
 * Options / Builder
 * ============================================================================= */

/// Construction parameters, serializable so they can live in a config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestOptions {
    /// Accuracy/size trade-off; larger keeps more centroids.
    pub compression: f64,
    /// Seed for the internal generator; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for DigestOptions {
    fn default() -> Self {
        Self {
            compression: DEFAULT_COMPRESSION,
            seed: None,
        }
    }
}

/// Builder for [`TDigest`].
#[derive(Debug, Clone, Default)]
pub struct TDigestBuilder {
    opts: DigestOptions,
}

impl TDigestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compression(mut self, compression: f64) -> Self {
        self.opts.compression = compression;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.opts.seed = Some(seed);
        self
    }

    /// Replace every option at once.
    pub fn options(mut self, opts: DigestOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn build(self) -> TdResult<TDigest> {
        let rng = match self.opts.seed {
            Some(seed) => DefaultRng::seed_from_u64(seed),
            None => DefaultRng::from_os_rng(),
        };
        TDigest::with_rng(self.opts.compression, rng)
    }
}

/* =============================================================================
 * Construction
 * ============================================================================= */

impl TDigest<DefaultRng> {
    /// Empty digest with an OS-seeded generator.
    pub fn new(compression: f64) -> TdResult<Self> {
        Self::with_rng(compression, DefaultRng::from_os_rng())
    }

    /// Empty digest whose randomized choices are reproducible.
    pub fn with_seed(compression: f64, seed: u64) -> TdResult<Self> {
        Self::with_rng(compression, DefaultRng::seed_from_u64(seed))
    }

    pub fn builder() -> TDigestBuilder {
        TDigestBuilder::new()
    }
}

impl<R: RngCore> TDigest<R> {
    /// Empty digest driven by a caller-supplied generator.
    pub fn with_rng(compression: f64, rng: R) -> TdResult<Self> {
        let compression = validate_compression(compression)?;
        Ok(Self {
            summary: Summary::with_capacity(initial_capacity(compression)),
            compression,
            count: 0,
            rng,
        })
    }
}

/* =============================================================================
 * Accessors
 * ============================================================================= */

impl<R> TDigest<R> {
    #[inline]
    pub fn compression(&self) -> f64 {
        self.compression
    }

    /// Sum of the weights of every sample added so far.
    #[inline]
    pub fn total_weight(&self) -> u32 {
        self.count
    }

    #[inline]
    pub fn centroid_count(&self) -> usize {
        self.summary.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
    }

    /// Smallest centroid mean, `None` when empty.
    pub fn min(&self) -> Option<f64> {
        self.summary.min().map(|c| c.mean())
    }

    /// Largest centroid mean, `None` when empty.
    pub fn max(&self) -> Option<f64> {
        self.summary.max().map(|c| c.mean())
    }

    /// Centroids in ascending mean order.
    pub fn centroids(&self) -> impl Iterator<Item = Centroid> + '_ {
        self.summary.iter()
    }

    /// Visit `(mean, weight)` in ascending mean order until `f` returns `false`.
    pub fn for_each_centroid<F>(&self, mut f: F)
    where
        F: FnMut(f64, u32) -> bool,
    {
        self.summary.for_each(|c| f(c.mean(), c.weight()));
    }

    #[inline]
    pub(crate) fn summary(&self) -> &Summary {
        &self.summary
    }
}

/* =============================================================================
 * Ingestion / compression / merge
 * ============================================================================= */

impl<R: RngCore> TDigest<R> {
    /// Add one sample with weight 1.
    #[inline]
    pub fn insert(&mut self, value: f64) -> TdResult<()> {
        self.insert_weighted(value, 1)
    }

    /// Insert every value with weight 1, stopping at the first rejected one.
    pub fn insert_many<I>(&mut self, values: I) -> TdResult<()>
    where
        I: IntoIterator<Item = f64>,
    {
        values.into_iter().try_for_each(|v| self.insert(v))
    }

    /// Add `weight` samples located at `value`.
    ///
    /// Rejects NaN, ±infinity and zero weight before touching any state.
    pub fn insert_weighted(&mut self, value: f64, weight: u32) -> TdResult<()> {
        if value.is_nan() {
            return Err(TdError::NaNInput {
                context: "sample value",
            });
        }
        if value.is_infinite() {
            return Err(TdError::NonFiniteInput {
                context: "sample value",
            });
        }
        if weight == 0 {
            return Err(TdError::ZeroWeight {
                context: "sample weight",
            });
        }
        self.count = self
            .count
            .checked_add(weight)
            .ok_or(TdError::WeightOverflow { context: "insert" })?;

        self.ingest(value, weight)?;

        if self.summary.len() as f64 > AUTO_COMPRESS_FACTOR * self.compression {
            self.compress()?;
        }
        Ok(())
    }

    /// Place `weight` samples at `value`, assuming `self.count` already
    /// includes them. Never compresses.
    fn ingest(&mut self, value: f64, mut weight: u32) -> TdResult<()> {
        if self.summary.is_empty() {
            trace!(value, weight, "first centroid");
            return self.summary.add(value, weight);
        }

        let mut candidates = self.nearest_centroids(value)?;
        while !candidates.is_empty() && weight > 0 {
            let pick = pick_index(&mut self.rng, candidates.len());
            let chosen = candidates.swap_remove(pick);

            let q = self.centroid_quantile(&chosen);
            let limit = threshold(q, self.count, self.compression);
            let held = f64::from(chosen.weight());
            if held + f64::from(weight) > limit {
                continue;
            }

            let accepted = (limit - held).min(f64::from(weight)) as u32;
            if accepted == 0 {
                continue;
            }
            self.summary
                .update_by_mean(chosen.mean(), value, accepted)?;
            weight -= accepted;
        }

        if weight > 0 {
            trace!(value, weight, centroids = self.summary.len(), "new centroid");
            self.summary.add(value, weight)?;
        }
        Ok(())
    }

    /// Closest centroid(s) to `value`: both neighbours when they are distinct
    /// and exactly equidistant, otherwise the single nearest one.
    fn nearest_centroids(&self, value: f64) -> TdResult<Vec<Centroid>> {
        match self.summary.ceiling_and_floor(value) {
            (None, None) => Err(TdError::Invariant {
                what: "nearest-centroid lookup on an empty store",
            }),
            (Some(only), None) | (None, Some(only)) => Ok(vec![only]),
            (Some(ceil), Some(floor)) => {
                let up = (ceil.mean() - value).abs();
                let down = (floor.mean() - value).abs();
                if down < up {
                    Ok(vec![floor])
                } else if down == up && floor.mean() != ceil.mean() {
                    Ok(vec![floor, ceil])
                } else {
                    Ok(vec![ceil])
                }
            }
        }
    }

    /// Normalized rank of the middle of `c`.
    #[inline]
    fn centroid_quantile(&self, c: &Centroid) -> f64 {
        let below = f64::from(self.summary.sum_until(c.mean()));
        (f64::from(c.weight()) / 2.0 + below) / f64::from(self.count)
    }

    /// Rebuild the centroid set by replaying every centroid, in random order,
    /// through the insertion path against a fresh store.
    ///
    /// The running total restarts at zero and grows as centroids are replayed,
    /// so size limits during the replay track the weight seen so far.
    pub fn compress(&mut self) -> TdResult<()> {
        if self.summary.len() <= 1 {
            return Ok(());
        }
        let before = self.summary.len();
        let total = self.count;

        let fresh = Summary::with_capacity(initial_capacity(self.compression));
        let mut nodes = std::mem::replace(&mut self.summary, fresh).to_vec();
        shuffle(&mut nodes, &mut self.rng);

        self.count = 0;
        for c in nodes {
            // Partial sums of a set whose total already fit in u32.
            self.count += c.weight();
            self.ingest(c.mean(), c.weight())?;
        }
        debug_assert_eq!(self.count, total);
        debug_assert_eq!(self.summary.total_weight(), total);
        debug_assert!(
            is_sorted_strict_by_mean(&self.summary.to_vec()),
            "duplicate centroid means after compress"
        );

        debug!(
            before,
            after = self.summary.len(),
            total_weight = total,
            "compressed digest"
        );
        Ok(())
    }

    /// Fold every centroid of `other` into `self`, in random order.
    ///
    /// `other` is left untouched. Fails up front, with `self` unchanged, if
    /// the combined weight would overflow.
    pub fn merge<S>(&mut self, other: &TDigest<S>) -> TdResult<()> {
        if other.is_empty() {
            return Ok(());
        }
        self.count
            .checked_add(other.count)
            .ok_or(TdError::WeightOverflow { context: "merge" })?;

        let mut nodes = other.summary.to_vec();
        shuffle(&mut nodes, &mut self.rng);
        let incoming = nodes.len();
        for c in nodes {
            self.insert_weighted(c.mean(), c.weight())?;
        }

        debug!(
            incoming,
            centroids = self.summary.len(),
            total_weight = self.count,
            "merged digest"
        );
        Ok(())
    }
}
