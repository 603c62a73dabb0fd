//! Order-statistics index over centroid weights (Fenwick / binary-indexed tree).
//!
//! Positions are 0-based. `sum(i)` covers positions `[0, i)`. Backing storage
//! grows on demand; new nodes are seeded from the existing prefix sums, so a
//! write past the current capacity never disturbs them.
//!
//! Arithmetic is modulo 2^32: `set` applies `value - current` as a wrapping
//! delta, which is how a decrease is expressed with unsigned weights. Every
//! prefix the store actually asks for is bounded by the digest's total weight,
//! which itself fits in `u32`.

#[inline]
fn lsb(i: usize) -> usize {
    i & i.wrapping_neg()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fenwick {
    buf: Vec<u32>,
}

impl Fenwick {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
        }
    }

    /// Number of tracked positions (grows, never shrinks).
    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Grow so that `position` is addressable. New nodes whose range reaches
    /// back into the old storage are seeded with that partial sum.
    fn accommodate(&mut self, position: usize) {
        let old = self.buf.len();
        if old > position {
            return;
        }
        let new_len = (position + 1).max(old * 2);
        let total = self.sum(old);
        let fresh: Vec<u32> = (old..new_len)
            .map(|j| {
                let start = j + 1 - lsb(j + 1);
                if start < old {
                    total.wrapping_sub(self.sum(start))
                } else {
                    0
                }
            })
            .collect();
        self.buf.extend(fresh);
    }

    /// Add `delta` (wrapping) to the weight stored at `position`.
    pub fn add(&mut self, position: usize, delta: u32) {
        self.accommodate(position);
        let mut i = position;
        while i < self.buf.len() {
            self.buf[i] = self.buf[i].wrapping_add(delta);
            i += lsb(i + 1);
        }
    }

    /// Total of all weights at positions `< position`.
    pub fn sum(&self, position: usize) -> u32 {
        let mut i = position.min(self.buf.len());
        let mut total = 0u32;
        while i > 0 {
            total = total.wrapping_add(self.buf[i - 1]);
            i -= lsb(i);
        }
        total
    }

    /// Weight stored at exactly `position`.
    #[inline]
    pub fn get(&self, position: usize) -> u32 {
        self.sum(position + 1).wrapping_sub(self.sum(position))
    }

    /// Overwrite the weight at `position`.
    pub fn set(&mut self, position: usize, value: u32) {
        let delta = value.wrapping_sub(self.get(position));
        self.add(position, delta);
    }

    /// Replace every weight at once: `values[i]` at position `i`, zero beyond.
    /// Linear time; capacity never shrinks.
    pub fn rebuild(&mut self, values: &[u32]) {
        if self.buf.len() < values.len() {
            self.buf.resize(values.len(), 0);
        }
        self.buf[..values.len()].copy_from_slice(values);
        self.buf[values.len()..].fill(0);
        for i in 0..self.buf.len() {
            let parent = i + lsb(i + 1);
            if parent < self.buf.len() {
                self.buf[parent] = self.buf[parent].wrapping_add(self.buf[i]);
            }
        }
    }
}
