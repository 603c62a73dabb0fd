pub mod centroids;
pub mod test_helpers;
pub mod wire;

// Internal building blocks
mod cdf;
mod fenwick;
mod quantile;
mod random;
mod scale;
mod summary;
mod tdigest;

// Public surface
pub use centroids::Centroid;
pub use random::DefaultRng;
pub use tdigest::{DigestOptions, TDigest, TDigestBuilder, DEFAULT_COMPRESSION};
pub use wire::{WireError, WireResult};
