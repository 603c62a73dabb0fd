//! Assertions and exact reference statistics shared by unit and integration
//! tests.

pub fn assert_exact(label: &str, expected: f64, got: f64) {
    assert!(
        expected == got,
        "{}: expected exactly {:.9}, got {:.9}",
        label,
        expected,
        got
    );
}

pub fn assert_rel_close(label: &str, expected: f64, got: f64, rtol: f64) {
    let denom = expected.abs().max(1e-300);
    let rel = ((expected - got).abs()) / denom;
    assert!(
        rel < rtol,
        "{}: expected ~= {:.9}, got {:.9}, rel_err={:.6e}, rtol={:.6e}",
        label,
        expected,
        got,
        rel,
        rtol
    );
}

pub fn assert_abs_close(label: &str, expected: f64, got: f64, atol: f64) {
    let diff = (expected - got).abs();
    assert!(
        diff < atol,
        "{}: expected ~= {:.9}, got {:.9}, abs_err={:.6e}, atol={:.6e}",
        label,
        expected,
        got,
        diff,
        atol
    );
}

pub fn assert_monotone_chain(label: &str, values: &[f64]) {
    for i in 1..values.len() {
        assert!(
            values[i] >= values[i - 1],
            "{}: non-monotone at i={}: {} < {}",
            label,
            i,
            values[i],
            values[i - 1]
        );
    }
}

/// Linear-interpolation quantile over ascending `sorted` data
/// (index `q·(n−1)`; `q = 1` is the last element).
pub fn exact_quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if q >= 1.0 || n == 1 {
        return sorted[n - 1];
    }
    let index = q * (n - 1) as f64;
    let lo = index.floor() as usize;
    let frac = index - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[lo + 1] * frac
}

/// Mid-rank CDF: average of the strict (`< x`) and non-strict (`<= x`)
/// counts, over `n`.
pub fn exact_cdf(data: &[f64], x: f64) -> f64 {
    let strict = data.iter().filter(|&&v| v < x).count();
    let inclusive = data.iter().filter(|&&v| v <= x).count();
    (strict + inclusive) as f64 / 2.0 / data.len() as f64
}
