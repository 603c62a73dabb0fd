//! Ordered centroid store.
//!
//! Means live in a sorted `Vec<f64>` with a parallel `Vec<u32>` of weights and a
//! [`Fenwick`] index over those weights, so both neighbour lookups (binary
//! search on means) and rank lookups (prefix sums on weights) are logarithmic.
//!
//! Invariants after every public mutation:
//! - `keys` is strictly ascending (no duplicate means);
//! - `keys.len() == counts.len()`;
//! - `fen.get(i) == counts[i]` for every live position, and `fen.sum(len)`
//!   is the total weight.
//!
//! The index is sum-addressed, not mean-addressed: whenever a centroid moves
//! to a new position the index must be rewritten for every position whose
//! weight changed. [`Summary::swap_adjacent`] is the only place that happens
//! during updates.

use crate::tdigest::centroids::Centroid;
use crate::tdigest::fenwick::Fenwick;
use crate::{TdError, TdResult};

#[derive(Debug, Clone, Default)]
pub struct Summary {
    keys: Vec<f64>,
    counts: Vec<u32>,
    fen: Fenwick,
}

impl Summary {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            counts: Vec::with_capacity(capacity),
            fen: Fenwick::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sum of all weights, read from the index.
    #[inline]
    pub fn total_weight(&self) -> u32 {
        self.fen.sum(self.len())
    }

    /// Lowest position whose mean is `>= mean` (`len()` if none).
    pub fn find_index(&self, mean: f64) -> usize {
        self.keys.partition_point(|&k| k < mean)
    }

    #[inline]
    fn mean_at_index_is(&self, index: usize, mean: f64) -> bool {
        index < self.keys.len() && self.keys[index] == mean
    }

    /// Exact lookup by mean.
    pub fn find(&self, mean: f64) -> Option<Centroid> {
        let idx = self.find_index(mean);
        if self.mean_at_index_is(idx, mean) {
            self.at(idx)
        } else {
            None
        }
    }

    pub fn at(&self, index: usize) -> Option<Centroid> {
        if index < self.len() {
            Some(Centroid::new(self.keys[index], self.counts[index]))
        } else {
            None
        }
    }

    #[inline]
    pub fn min(&self) -> Option<Centroid> {
        self.at(0)
    }

    #[inline]
    pub fn max(&self) -> Option<Centroid> {
        self.len().checked_sub(1).and_then(|i| self.at(i))
    }

    #[inline]
    fn before(&self, index: usize) -> Option<Centroid> {
        index.checked_sub(1).and_then(|i| self.at(i))
    }

    /// Centroids strictly above and strictly below `mean`, as `(successor, predecessor)`.
    /// `mean` does not need to be present in the store.
    pub fn successor_and_predecessor(&self, mean: f64) -> (Option<Centroid>, Option<Centroid>) {
        let idx = self.find_index(mean);
        let succ = if self.mean_at_index_is(idx, mean) {
            self.at(idx + 1)
        } else {
            self.at(idx)
        };
        (succ, self.before(idx))
    }

    /// Closest centroids `>= mean` and `<= mean`, as `(ceiling, floor)`.
    ///
    /// An exact hit returns the same centroid twice; above every mean yields
    /// `(None, max)`, below every mean yields `(min, None)`.
    pub fn ceiling_and_floor(&self, mean: f64) -> (Option<Centroid>, Option<Centroid>) {
        let idx = self.find_index(mean);
        if idx == self.len() {
            return (None, self.max());
        }
        let item = self.at(idx);
        if self.keys[idx] == mean {
            return (item, item);
        }
        (item, self.before(idx))
    }

    /// Cumulative weight of every centroid whose mean is strictly below `mean`.
    pub fn sum_until(&self, mean: f64) -> u32 {
        self.fen.sum(self.find_index(mean))
    }

    /// Insert a centroid, or fold `weight` into the centroid that already sits
    /// exactly at `mean`.
    pub fn add(&mut self, mean: f64, weight: u32) -> TdResult<()> {
        if mean.is_nan() {
            return Err(TdError::NaNInput {
                context: "centroid mean",
            });
        }
        if weight == 0 {
            return Err(TdError::ZeroWeight {
                context: "centroid weight",
            });
        }

        let idx = self.find_index(mean);
        if self.mean_at_index_is(idx, mean) {
            return self.update_at(idx, mean, weight);
        }

        self.keys.insert(idx, mean);
        self.counts.insert(idx, weight);
        // Everything from the insertion point on shifted by one slot.
        self.resync();
        Ok(())
    }

    /// Fold `weight` samples at `value` into the centroid at `index`, then
    /// restore ordering by walking the centroid past any neighbour it crossed.
    pub fn update_at(&mut self, index: usize, value: f64, weight: u32) -> TdResult<()> {
        if index >= self.len() {
            return Err(TdError::Invariant {
                what: "update_at: position out of range",
            });
        }
        let old_mean = self.keys[index];
        let mut c = Centroid::new(old_mean, self.counts[index]);
        if c.weight().checked_add(weight).is_none() {
            return Err(TdError::WeightOverflow {
                context: "centroid weight",
            });
        }
        c.update(value, weight);

        self.keys[index] = c.mean();
        self.counts[index] = c.weight();
        self.fen.add(index, weight);

        let settled = if c.mean() > old_mean {
            self.adjust_right(index)
        } else if c.mean() < old_mean {
            self.adjust_left(index)
        } else {
            index
        };
        self.coalesce_around(settled);
        Ok(())
    }

    /// Update the centroid whose mean is exactly `mean`. A miss means the caller
    /// holds a stale view of the store, which is a defect, not a data error.
    pub fn update_by_mean(&mut self, mean: f64, value: f64, weight: u32) -> TdResult<()> {
        if self.find(mean).is_none() {
            return Err(TdError::Invariant {
                what: "update of a centroid that is not in the store",
            });
        }
        self.update_at(self.find_index(mean), value, weight)
    }

    /// Swap the centroids at `i` and `i + 1` and rewrite the index at both
    /// positions.
    pub fn swap_adjacent(&mut self, i: usize) {
        debug_assert!(i + 1 < self.len());
        self.keys.swap(i, i + 1);
        self.counts.swap(i, i + 1);
        self.fen.set(i, self.counts[i]);
        self.fen.set(i + 1, self.counts[i + 1]);
    }

    fn adjust_right(&mut self, mut i: usize) -> usize {
        while i + 1 < self.len() && self.keys[i] > self.keys[i + 1] {
            self.swap_adjacent(i);
            i += 1;
        }
        i
    }

    fn adjust_left(&mut self, mut i: usize) -> usize {
        while i > 0 && self.keys[i - 1] > self.keys[i] {
            self.swap_adjacent(i - 1);
            i -= 1;
        }
        i
    }

    /// A moved mean can land exactly on a neighbour's mean; fold such a pair
    /// into one centroid so means stay unique.
    fn coalesce_around(&mut self, i: usize) {
        if i + 1 < self.len() && self.keys[i] == self.keys[i + 1] {
            self.merge_into_left(i);
        } else if i > 0 && self.keys[i - 1] == self.keys[i] {
            self.merge_into_left(i - 1);
        }
    }

    fn merge_into_left(&mut self, i: usize) {
        self.counts[i] += self.counts[i + 1];
        self.keys.remove(i + 1);
        self.counts.remove(i + 1);
        self.resync();
    }

    /// Rewrite the index after positions shifted (insertion or removal).
    fn resync(&mut self) {
        self.fen.rebuild(&self.counts);
    }

    /// Ascending-by-mean iterator over centroid copies.
    pub fn iter(&self) -> impl Iterator<Item = Centroid> + '_ {
        self.keys
            .iter()
            .zip(&self.counts)
            .map(|(&m, &w)| Centroid::new(m, w))
    }

    /// Visit centroids in ascending order until `f` returns `false`.
    pub fn for_each<F: FnMut(Centroid) -> bool>(&self, mut f: F) {
        for c in self.iter() {
            if !f(c) {
                break;
            }
        }
    }

    /// Snapshot of every centroid, ascending.
    pub fn to_vec(&self) -> Vec<Centroid> {
        self.iter().collect()
    }
}
