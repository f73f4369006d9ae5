//! The DRIVE quantization stage: clamp, bucketize, scale, and back.

use std::sync::Arc;

use crate::codebook::{CodebookCache, CodebookTables, Device};
use crate::config::DriveConfig;
use crate::error::{Error, Result};

use super::assign::assign_scaled;
use super::clamp::OutlierClamp;
use super::code::{Code, DriveCode};
use super::scale::{codebook_energy, k_bit_scale, normalization_factor, one_bit_scale, RowNorms};

/// How reductions (norms, mean, std) span the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// The whole input is one vector with one scale.
    Whole,
    /// The input is row-major with rows of `row_len`; each row gets its own
    /// scale and clamp bounds.
    RowWise {
        /// Coordinates per row.
        row_len: usize,
    },
}

/// Immutable DRIVE quantizer for one configuration.
///
/// Encoding is a pure function of the input and the configuration; the
/// only shared state is the codebook tables resolved at construction.
///
/// # Example
///
/// ```rust
/// use drive_core::{CodebookCache, DriveConfig, DriveStage};
///
/// let cache = CodebookCache::new();
/// let stage = DriveStage::new(&DriveConfig::new(4), &cache)?;
///
/// let x = vec![0.3, -1.2, 0.8, 2.0, -0.1, 0.0, 1.1, -0.7];
/// let code = stage.encode(&x)?;
/// let approx = stage.decode(&code)?;
/// assert_eq!(approx.len(), x.len());
/// # Ok::<(), drive_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DriveStage {
    bits: u8,
    bias_correction: bool,
    clamp: Option<OutlierClamp>,
    reduction: Reduction,
    tables: Arc<CodebookTables>,
}

impl DriveStage {
    /// Builds a stage from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn new(config: &DriveConfig, cache: &CodebookCache) -> Result<Self> {
        config.validate()?;
        let clamp = config.std_outlier_factor.map(OutlierClamp::new).transpose()?;
        let tables = cache.tables(config.bits, config.device)?;
        Ok(Self {
            bits: config.bits,
            bias_correction: config.bias_correction,
            clamp,
            reduction: config.reduction()?,
            tables,
        })
    }

    /// Bit-width.
    #[must_use]
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Whether the bias-corrected scale is used.
    #[must_use]
    pub fn bias_correction(&self) -> bool {
        self.bias_correction
    }

    /// Reduction strategy.
    #[must_use]
    pub fn reduction(&self) -> Reduction {
        self.reduction
    }

    /// Outlier clamp, if configured.
    #[must_use]
    pub fn outlier_clamp(&self) -> Option<OutlierClamp> {
        self.clamp
    }

    /// Device the codebook tables belong to.
    #[must_use]
    pub fn device(&self) -> Device {
        self.tables.device()
    }

    /// Encodes a vector (or a row-major batch in row-wise mode).
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] for an empty input, or clamping with rows shorter than 2
    /// - [`Error::DimensionMismatch`] if a batch is not a whole number of rows
    /// - [`Error::DegenerateInput`] if any row has a zero norm
    pub fn encode(&self, x: &[f32]) -> Result<DriveCode> {
        let row_len = self.row_len_for(x.len())?;
        let rows = x.len() / row_len;
        tracing::trace!(bits = self.bits, rows, len = x.len(), "drive encode");

        let encoded = map_rows(rows, |r| {
            self.encode_row(r, &x[r * row_len..(r + 1) * row_len])
        })?;

        let mut scales = Vec::with_capacity(rows);
        let mut values = Vec::with_capacity(x.len());
        for (row_values, scale) in encoded {
            scales.push(scale);
            values.extend(row_values);
        }

        if let Some(row) = scales.iter().position(|s| !s.is_finite()) {
            tracing::warn!(
                row,
                scale = scales[row],
                "drive encode produced a non-finite scale"
            );
        }

        let code = if self.bits == 1 {
            Code::Signs(values.into_iter().map(|v| v == 1).collect())
        } else {
            Code::Indices(values)
        };
        DriveCode::new(self.bits, row_len, scales, code)
    }

    /// Reconstructs the approximate vector (or batch) from a code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCode`] if the code was produced for another
    /// bit-width or is internally inconsistent, and
    /// [`Error::DimensionMismatch`] if its row layout does not match this stage.
    pub fn decode(&self, code: &DriveCode) -> Result<Vec<f32>> {
        code.validate()?;
        if code.bits() != self.bits {
            return Err(Error::InvalidCode(format!(
                "{}-bit code given to a {}-bit stage",
                code.bits(),
                self.bits
            )));
        }
        match self.reduction {
            Reduction::Whole if code.rows() != 1 => {
                return Err(Error::InvalidCode(format!(
                    "whole-vector stage expects 1 scale, got {}",
                    code.rows()
                )));
            }
            Reduction::RowWise { row_len } if row_len != code.row_len() => {
                return Err(Error::DimensionMismatch {
                    expected: row_len,
                    actual: code.row_len(),
                });
            }
            _ => {}
        }

        let row_len = code.row_len();
        tracing::trace!(bits = self.bits, rows = code.rows(), len = code.len(), "drive decode");

        let rows = map_rows(code.rows(), |r| {
            let scale = code.scales()[r];
            let span = r * row_len..(r + 1) * row_len;
            Ok(match code.code() {
                Code::Signs(signs) => signs[span]
                    .iter()
                    .map(|&s| if s { scale } else { -scale })
                    .collect::<Vec<f32>>(),
                Code::Indices(indices) => {
                    let centroids = self.tables.centroids();
                    indices[span]
                        .iter()
                        .map(|&i| scale * centroids[usize::from(i)])
                        .collect()
                }
            })
        })?;
        Ok(rows.concat())
    }

    fn row_len_for(&self, len: usize) -> Result<usize> {
        if len == 0 {
            return Err(Error::Config("cannot encode an empty vector".to_string()));
        }
        match self.reduction {
            Reduction::Whole => Ok(len),
            Reduction::RowWise { row_len } if len % row_len == 0 => Ok(row_len),
            Reduction::RowWise { row_len } => Err(Error::DimensionMismatch {
                expected: row_len * (len / row_len + 1),
                actual: len,
            }),
        }
    }

    /// Encodes one row into raw code values (sign bit or index) and its scale.
    #[allow(clippy::cast_possible_truncation)] // Reason: scales are f32 by contract
    fn encode_row(&self, row_idx: usize, row: &[f32]) -> Result<(Vec<u8>, f32)> {
        let clamped;
        let row = match &self.clamp {
            Some(clamp) => {
                clamped = clamp.apply(row)?;
                clamped.as_slice()
            }
            None => row,
        };

        let norms = RowNorms::of(row);

        if self.bits == 1 {
            if norms.l1 == 0.0 {
                return Err(Error::DegenerateInput {
                    row: row_idx,
                    norm: "l1",
                });
            }
            let signs = row.iter().map(|&v| u8::from(v >= 0.0)).collect();
            let scale = one_bit_scale(&norms, self.bias_correction);
            return Ok((signs, scale as f32));
        }

        if norms.sum_squares == 0.0 {
            return Err(Error::DegenerateInput {
                row: row_idx,
                norm: "l2",
            });
        }

        let factor = normalization_factor(&norms);
        let indices = assign_scaled(row, factor, self.tables.boundaries());

        let energy = if self.bias_correction {
            codebook_energy(&indices, self.tables.centroids())
        } else {
            0.0
        };
        let scale = k_bit_scale(&norms, energy, self.bias_correction);
        Ok((indices, scale as f32))
    }
}

/// Runs `f` over row indices, in parallel when there is more than one row.
fn map_rows<T, F>(rows: usize, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        if rows > 1 {
            use rayon::prelude::*;
            return (0..rows).into_par_iter().map(&f).collect();
        }
    }
    (0..rows).map(f).collect()
}
