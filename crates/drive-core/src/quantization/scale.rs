//! Scale estimation for DRIVE encoding.
//!
//! All reductions accumulate in `f64` over the `f32` input. The caller
//! decides what a "row" is: the whole vector, or one row of a batch.

/// Per-row reductions needed by every scale formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowNorms {
    /// Sum of absolute values.
    pub l1: f64,
    /// Sum of squares.
    pub sum_squares: f64,
    /// Number of coordinates.
    pub len: usize,
}

impl RowNorms {
    /// Computes the reductions of `row`.
    #[must_use]
    pub fn of(row: &[f32]) -> Self {
        let (l1, sum_squares) = row.iter().fold((0.0_f64, 0.0_f64), |(l1, ss), &v| {
            let v = f64::from(v);
            (l1 + v.abs(), ss + v * v)
        });
        Self {
            l1,
            sum_squares,
            len: row.len(),
        }
    }

    /// Euclidean norm.
    #[must_use]
    pub fn l2(&self) -> f64 {
        self.sum_squares.sqrt()
    }

    #[allow(clippy::cast_precision_loss)] // Reason: row lengths are far below 2^52
    fn len_f64(&self) -> f64 {
        self.len as f64
    }
}

/// Scale for the 1-bit (sign) code.
///
/// Bias-corrected: `sum(x^2) / sum(|x|)`, which makes the reconstruction's
/// dot product with `x` equal `||x||^2`. Otherwise the mean absolute value.
#[must_use]
pub fn one_bit_scale(norms: &RowNorms, bias_correction: bool) -> f64 {
    if bias_correction {
        norms.sum_squares / norms.l1
    } else {
        norms.l1 / norms.len_f64()
    }
}

/// Factor mapping a row onto unit RMS before bucketization: `sqrt(n) / ||x||`.
#[must_use]
pub fn normalization_factor(norms: &RowNorms) -> f64 {
    norms.len_f64().sqrt() / norms.l2()
}

/// Scale for a k-bit code.
///
/// `codebook_energy` is the sum of squares of the centroids the row was
/// assigned to. Bias-corrected: `||x|| * sqrt(n) / codebook_energy`.
/// Otherwise `||x|| / sqrt(n)`, the inverse of [`normalization_factor`].
#[must_use]
pub fn k_bit_scale(norms: &RowNorms, codebook_energy: f64, bias_correction: bool) -> f64 {
    let sqrt_n = norms.len_f64().sqrt();
    if bias_correction {
        norms.l2() * sqrt_n / codebook_energy
    } else {
        norms.l2() / sqrt_n
    }
}

/// Sum of squares of the centroids selected by `indices`.
#[must_use]
pub fn codebook_energy(indices: &[u8], centroids: &[f32]) -> f64 {
    indices
        .iter()
        .map(|&i| {
            let c = f64::from(centroids[usize::from(i)]);
            c * c
        })
        .sum()
}
