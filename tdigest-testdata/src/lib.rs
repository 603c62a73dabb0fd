//! tdigest-testdata
//! Synthetic sample streams shared by fen-tdigest tests and benches.
//!
//! Continuous shapes (`Uniform`, `Normal`, `Clumped`) land in \[0,1] so error
//! tolerances are comparable; ordered shapes (`Sequential`, `Permuted`) emit
//! the integers `0..n`, which is what stresses a digest's tails.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Stride for [`StreamKind::Permuted`]; prime, so `(i·STRIDE) mod n` visits
/// every residue unless `n` is a multiple of it.
pub const PERMUTE_STRIDE: usize = 1_627;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StreamKind {
    /// Uniform in \[0,1)
    Uniform,
    /// N(0.5, 0.2²) clamped to \[0,1]
    Normal,
    /// Three tight clumps at 0.1/0.5/0.9 over a thin uniform floor
    Clumped,
    /// `0, 1, 2, …, n−1` in ascending order
    Sequential,
    /// `(i·1627) mod n`: every integer below `n` once, in a scrambled but
    /// deterministic order
    Permuted,
}

/// `n` samples of the chosen shape. Seeded shapes are reproducible per `seed`;
/// ordered shapes ignore it.
pub fn gen_stream(kind: StreamKind, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    match kind {
        StreamKind::Uniform => (0..n).map(|_| rng.random::<f64>()).collect(),
        StreamKind::Normal => {
            let normal = Normal::<f64>::new(0.5, 0.2).expect("valid normal parameters");
            (0..n)
                .map(|_| normal.sample(&mut rng).clamp(0.0, 1.0))
                .collect()
        }
        StreamKind::Clumped => (0..n).map(|_| clumped(&mut rng)).collect(),
        StreamKind::Sequential => (0..n).map(|i| i as f64).collect(),
        StreamKind::Permuted => (0..n).map(|i| ((i * PERMUTE_STRIDE) % n) as f64).collect(),
    }
}

fn clumped(rng: &mut StdRng) -> f64 {
    if rng.random_bool(0.1) {
        return rng.random::<f64>();
    }
    let center: f64 = match rng.random_range(0..3) {
        0 => 0.1,
        1 => 0.5,
        _ => 0.9,
    };
    (center + rng.random_range(-1e-3..1e-3)).clamp(0.0, 1.0)
}

/// Split `values` round-robin into `parts` streams (part `i % parts` gets
/// sample `i`), as when one stream is sharded across workers.
pub fn round_robin(values: &[f64], parts: usize) -> Vec<Vec<f64>> {
    assert!(parts > 0, "round_robin needs at least one part");
    let mut out = vec![Vec::with_capacity(values.len() / parts + 1); parts];
    for (i, &v) in values.iter().enumerate() {
        out[i % parts].push(v);
    }
    out
}

/// Reproducibly shuffled copy of `values`.
pub fn shuffled(values: &[f64], seed: u64) -> Vec<f64> {
    let mut out = values.to_vec();
    out.shuffle(&mut StdRng::seed_from_u64(seed));
    out
}

/// Ascending copy of `values` (total order, NaN-free input assumed).
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}
