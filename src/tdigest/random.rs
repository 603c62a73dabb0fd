//! Randomized ordering for insertion tie-breaks and replay.
//!
//! Compression and merge replay centroids through the insertion path; a fixed
//! replay order (e.g. ascending) biases which centroids absorb weight. Both the
//! tie-break between equidistant neighbours and the replay shuffle draw from
//! the digest's own generator, so a seeded digest is fully reproducible.

use rand::rngs::StdRng;
use rand::RngCore;

/// Generator used when the caller does not plug in their own.
pub type DefaultRng = StdRng;

/// Map a full-range `u32` onto `[0, m)` with a multiply-shift instead of `%`.
#[inline]
pub(crate) fn fast_mod(n: u32, m: usize) -> usize {
    debug_assert!(m > 0 && m <= u32::MAX as usize);
    ((u64::from(n) * m as u64) >> 32) as usize
}

/// Uniform index in `[0, len)`.
#[inline]
pub(crate) fn pick_index<R: RngCore + ?Sized>(rng: &mut R, len: usize) -> usize {
    fast_mod(rng.next_u32(), len)
}

/// In-place Fisher-Yates shuffle.
pub(crate) fn shuffle<T, R: RngCore + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = pick_index(rng, i + 1);
        items.swap(i, j);
    }
}
