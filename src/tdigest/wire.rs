//! Compact binary encoding of a digest.
//!
//! Layout (multi-byte fixed-width fields are big-endian):
//!
//! | field        | type                 | notes                                   |
//! |--------------|----------------------|-----------------------------------------|
//! | version      | `u32`                | always [`SMALL_ENCODING`]               |
//! | compression  | `f64`                |                                         |
//! | count        | `u32`                | number of centroids, `<= MAX_CENTROIDS` |
//! | means        | `count × f32`        | delta from the previous mean (first from 0) |
//! | weights      | `count × uvarint`    | LEB128, each must fit in `u32`          |
//!
//! Means are stored as single-precision deltas and re-accumulated in `f64`,
//! so decoded means can differ from the originals by rounding. Decoding
//! replays every centroid through the insertion path of a fresh digest.
//! Bytes after the last weight are ignored.

use std::fmt;
use std::io::{Cursor, Read};

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use rand::{RngCore, SeedableRng};
use tracing::debug;

use crate::tdigest::random::DefaultRng;
use crate::tdigest::TDigest;
use crate::TdError;

/// The only encoding version this crate reads or writes.
pub const SMALL_ENCODING: u32 = 2;
/// Upper bound on the centroid count accepted by the decoder.
pub const MAX_CENTROIDS: u32 = 1 << 22;

/// Fixed header: version + compression + count.
const HEADER_LEN: usize = 4 + 8 + 4;

#[derive(Debug)]
pub enum WireError {
    UnsupportedVersion(u32),
    InvalidCentroidCount(u32),
    InvalidCompression(f64),
    /// A weight varint decoded to more than `u32::MAX`.
    ValueTooLarge(u64),
    /// A varint ran past ten bytes or past 64 bits.
    VarintOverflow,
    /// Input ended while reading the named field.
    Truncated(&'static str),
    /// A decoded centroid was rejected by the digest.
    Replay(TdError),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::UnsupportedVersion(v) => write!(
                f,
                "tdigest wire: unsupported encoding version {v} (expected {SMALL_ENCODING})"
            ),
            WireError::InvalidCentroidCount(n) => {
                write!(f, "tdigest wire: invalid centroid count {n} (max {MAX_CENTROIDS})")
            }
            WireError::InvalidCompression(c) => {
                write!(f, "tdigest wire: invalid compression {c}")
            }
            WireError::ValueTooLarge(v) => {
                write!(f, "tdigest wire: weight {v} does not fit in 32 bits")
            }
            WireError::VarintOverflow => write!(f, "tdigest wire: varint overflows 64 bits"),
            WireError::Truncated(what) => write!(f, "tdigest wire: input truncated in {what}"),
            WireError::Replay(e) => write!(f, "tdigest wire: rejected centroid: {e}"),
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WireError::Replay(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TdError> for WireError {
    fn from(e: TdError) -> Self {
        WireError::Replay(e)
    }
}

pub type WireResult<T> = Result<T, WireError>;

/* =============================================================================
 * Varints
 * ============================================================================= */

/// Append `value` as an unsigned LEB128 varint.
pub fn encode_uvarint32(buf: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Read one unsigned varint and require it to fit in `u32`.
pub fn decode_uvarint32<R: Read>(reader: &mut R) -> WireResult<u32> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = reader
            .read_u8()
            .map_err(|_| WireError::Truncated("centroid weight"))?;
        if shift == 63 && byte > 1 {
            return Err(WireError::VarintOverflow);
        }
        result |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
        if shift > 63 {
            return Err(WireError::VarintOverflow);
        }
    }
    u32::try_from(result).map_err(|_| WireError::ValueTooLarge(result))
}

#[inline]
fn uvarint32_len(value: u32) -> usize {
    let bits = 32 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/* =============================================================================
 * Encoding
 * ============================================================================= */

impl<R> TDigest<R> {
    /// Exact size of [`TDigest::to_bytes`] output.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN
            + self
                .centroids()
                .map(|c| 4 + uvarint32_len(c.weight()))
                .sum::<usize>()
    }

    /// Append the encoding of this digest to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.reserve(self.encoded_len());
        let mut scratch = [0u8; 8];

        BigEndian::write_u32(&mut scratch, SMALL_ENCODING);
        buf.extend_from_slice(&scratch[..4]);
        BigEndian::write_f64(&mut scratch, self.compression());
        buf.extend_from_slice(&scratch);
        // centroid_count() <= 20 × compression + 1 in practice; the decoder
        // enforces MAX_CENTROIDS.
        BigEndian::write_u32(&mut scratch, self.centroid_count() as u32);
        buf.extend_from_slice(&scratch[..4]);

        // Deltas are taken against the prefix the decoder will rebuild, so
        // f32 rounding does not accumulate. Gaps wider than f32 saturate and
        // are caught up by later deltas.
        let span = f64::from(f32::MAX);
        let mut prev = 0.0f64;
        for c in self.centroids() {
            let delta = (c.mean() - prev).clamp(-span, span) as f32;
            BigEndian::write_f32(&mut scratch, delta);
            buf.extend_from_slice(&scratch[..4]);
            prev += f64::from(delta);
        }
        for c in self.centroids() {
            encode_uvarint32(buf, c.weight());
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf
    }
}

/* =============================================================================
 * Decoding
 * ============================================================================= */

impl TDigest<DefaultRng> {
    /// Decode a digest, seeding its generator from the OS.
    pub fn from_bytes(bytes: &[u8]) -> WireResult<Self> {
        Self::from_bytes_with_rng(bytes, DefaultRng::from_os_rng())
    }
}

impl<R: RngCore> TDigest<R> {
    /// Decode a digest driven by `rng`.
    pub fn from_bytes_with_rng(bytes: &[u8], rng: R) -> WireResult<Self> {
        decode(bytes, rng).inspect_err(|e| {
            debug!(error = %e, len = bytes.len(), "rejected encoded digest");
        })
    }
}

fn decode<R: RngCore>(bytes: &[u8], rng: R) -> WireResult<TDigest<R>> {
    let mut cur = Cursor::new(bytes);

    let version = cur
        .read_u32::<BigEndian>()
        .map_err(|_| WireError::Truncated("format version"))?;
    if version != SMALL_ENCODING {
        return Err(WireError::UnsupportedVersion(version));
    }

    let compression = cur
        .read_f64::<BigEndian>()
        .map_err(|_| WireError::Truncated("compression"))?;
    let mut digest = TDigest::with_rng(compression, rng).map_err(|e| match e {
        TdError::InvalidCompression { value } => WireError::InvalidCompression(value),
        other => WireError::Replay(other),
    })?;

    let count = cur
        .read_u32::<BigEndian>()
        .map_err(|_| WireError::Truncated("centroid count"))?;
    if count > MAX_CENTROIDS {
        return Err(WireError::InvalidCentroidCount(count));
    }
    let count = count as usize;

    // Every centroid needs 4 mean bytes plus at least one weight byte.
    let remaining = bytes.len().saturating_sub(cur.position() as usize);
    if remaining < count * 5 {
        return Err(WireError::Truncated("centroid means"));
    }

    let mut means = Vec::with_capacity(count);
    let mut x = 0.0f64;
    for _ in 0..count {
        let delta = cur
            .read_f32::<BigEndian>()
            .map_err(|_| WireError::Truncated("centroid means"))?;
        x += f64::from(delta);
        means.push(x);
    }

    for mean in means {
        let weight = decode_uvarint32(&mut cur)?;
        digest.insert_weighted(mean, weight)?;
    }
    Ok(digest)
}
