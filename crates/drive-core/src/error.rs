//! Error types for DRIVE quantization.

use thiserror::Error;

/// Result type alias for quantization operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by codebook generation, encoding and decoding.
///
/// None of these are retryable: they either describe a bad configuration
/// or an input the algorithm cannot represent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid or unsupported configuration (bit-width, clamp factor, row layout).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The vector (or one row of a batch) has a zero norm, so no scale exists.
    #[error("Degenerate input: {norm} norm of row {row} is zero")]
    DegenerateInput {
        /// Offending row (0 in whole-vector mode).
        row: usize,
        /// Which norm vanished (`"l1"` or `"l2"`).
        norm: &'static str,
    },

    /// Input length does not match the configured layout.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length (or row length).
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Encoded data does not fit the codebook it is decoded with.
    #[error("Invalid code: {0}")]
    InvalidCode(String),
}

impl Error {
    /// Shorthand for the unsupported bit-width case.
    #[must_use]
    pub fn unsupported_bits(bits: u8) -> Self {
        Self::Config(format!(
            "unsupported bit-width {bits}, expected {}..={}",
            crate::codebook::MIN_BITS,
            crate::codebook::MAX_BITS
        ))
    }
}
