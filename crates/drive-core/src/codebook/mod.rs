//! Half-normal codebooks for DRIVE quantization.
//!
//! Each bit-width `b` owns `2^b` centroids, symmetric about zero, and the
//! `2^b - 1` midpoints between adjacent centroids. Inputs are scaled to unit
//! RMS before bucketization, so a single table per bit-width serves every
//! vector length.
//!
//! | Bits | Centroids | Boundaries |
//! |------|-----------|------------|
//! | 1 | 2 | 1 |
//! | 2 | 4 | 3 |
//! | 4 | 16 | 15 |
//! | 8 | 256 | 255 |

mod cache;
mod tables;

pub use cache::{CodebookCache, CodebookTables, Device};

use crate::error::{Error, Result};

/// Smallest supported bit-width.
pub const MIN_BITS: u8 = 1;

/// Largest supported bit-width. Indices always fit in a `u8`.
pub const MAX_BITS: u8 = 8;

/// Returns `true` if `bits` has a codebook.
#[must_use]
pub fn is_supported(bits: u8) -> bool {
    (MIN_BITS..=MAX_BITS).contains(&bits)
}

/// Number of centroids for a bit-width (`2^bits`).
#[must_use]
pub fn num_centroids(bits: u8) -> usize {
    1usize << bits
}

/// A generated codebook in full precision.
#[derive(Debug, Clone, PartialEq)]
pub struct Codebook {
    bits: u8,
    centroids: Vec<f64>,
    boundaries: Vec<f64>,
}

impl Codebook {
    /// Builds the codebook for `bits`.
    ///
    /// Centroids are the negated, reversed positive half-normal order
    /// statistics followed by the positive ones. Boundaries are the
    /// arithmetic midpoints of adjacent centroids.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `bits` is outside `1..=8`.
    pub fn generate(bits: u8) -> Result<Self> {
        if !is_supported(bits) {
            return Err(Error::unsupported_bits(bits));
        }

        let positive = tables::HALF_NORMAL_CENTROIDS[usize::from(bits - 1)];
        let centroids: Vec<f64> = positive
            .iter()
            .rev()
            .map(|&c| -c)
            .chain(positive.iter().copied())
            .collect();

        let boundaries = centroids
            .windows(2)
            .map(|pair| (pair[0] + pair[1]) / 2.0)
            .collect();

        Ok(Self {
            bits,
            centroids,
            boundaries,
        })
    }

    /// Bit-width of this codebook.
    #[must_use]
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Ascending centroids (`2^bits` values).
    #[must_use]
    pub fn centroids(&self) -> &[f64] {
        &self.centroids
    }

    /// Ascending cut points between buckets (`2^bits - 1` values).
    #[must_use]
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }
}
