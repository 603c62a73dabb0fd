//! Streaming t-digest with an order-statistics centroid index.
//!
//! ```
//! use fen_tdigest::TDigest;
//!
//! let mut digest = TDigest::with_seed(100.0, 7)?;
//! for i in 0..1_000 {
//!     digest.insert(f64::from(i))?;
//! }
//! let median = digest.quantile(0.5);
//! assert!((median - 500.0).abs() < 50.0);
//! assert!(digest.cdf(-1.0) == 0.0);
//! # Ok::<(), fen_tdigest::TdError>(())
//! ```

mod error;
pub mod tdigest;

pub use error::{TdError, TdResult};
pub use tdigest::{
    Centroid, DigestOptions, TDigest, TDigestBuilder, WireError, WireResult, DEFAULT_COMPRESSION,
};
