// src/error.rs
use core::fmt;

/// Library-wide error for fen-tdigest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TdError {
    /// A NaN sample reached the digest or the centroid store.
    /// `context` pinpoints where it came from (e.g., "sample value", "centroid mean").
    NaNInput { context: &'static str },

    /// A sample was ±infinity. The store tolerates it, the digest does not.
    NonFiniteInput { context: &'static str },

    /// A sample or centroid carried zero weight.
    ZeroWeight { context: &'static str },

    /// Compression must be finite and strictly positive.
    InvalidCompression { value: f64 },

    /// Quantile probe outside `[0, 1]` (only reported by the checked query).
    InvalidQuantile { q: f64 },

    /// The running total weight would no longer fit in 32 bits.
    WeightOverflow { context: &'static str },

    /// Internal invariant violation (should never happen; indicates a broken store).
    Invariant { what: &'static str },
}

impl fmt::Display for TdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TdError::NaNInput { context } => write!(
                f,
                "tdigest: NaN values are not allowed (got {}). \
hint: clean your data or drop NaNs before building the digest",
                context
            ),
            TdError::NonFiniteInput { context } => write!(
                f,
                "tdigest: non-finite values are not allowed ({}). hint: filter out ±inf before inserting",
                context
            ),
            TdError::ZeroWeight { context } => write!(
                f,
                "tdigest: weight must be > 0 ({}). hint: skip empty samples instead of inserting them",
                context
            ),
            TdError::InvalidCompression { value } => write!(
                f,
                "tdigest: invalid compression {}. hint: compression must be finite and > 0",
                value
            ),
            TdError::InvalidQuantile { q } => {
                write!(f, "tdigest: quantile must be within [0, 1] (got {})", q)
            }
            TdError::WeightOverflow { context } => write!(
                f,
                "tdigest: total weight overflows u32 ({}). hint: split the stream across digests",
                context
            ),
            TdError::Invariant { what } => {
                write!(f, "tdigest: internal invariant violation: {}", what)
            }
        }
    }
}

impl std::error::Error for TdError {}

pub type TdResult<T> = Result<T, TdError>;
