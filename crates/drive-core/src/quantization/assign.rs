//! Bucketization of normalized coordinates against sorted boundaries.
//!
//! Bucket `i` covers `[boundaries[i - 1], boundaries[i])`, with the outer
//! buckets open to infinity. A value equal to a boundary lands in the upper
//! bucket. NaN compares below every boundary and lands in bucket 0.

/// Index of the bucket containing `value`: the number of boundaries `<= value`.
#[inline]
#[must_use]
pub fn bucketize(value: f32, boundaries: &[f32]) -> usize {
    boundaries.partition_point(|&b| b <= value)
}

/// Assigns every coordinate of `values` to its bucket.
///
/// # Panics
///
/// Panics in debug builds if there are more than 256 buckets.
#[must_use]
pub fn assign(values: &[f32], boundaries: &[f32]) -> Vec<u8> {
    assign_scaled(values, 1.0, boundaries)
}

/// Assigns `values[i] * scale` to its bucket without materializing the
/// scaled vector.
///
/// The product is formed in f64 and only then narrowed, so a factor beyond
/// the f32 range (tiny rows) still yields unit-RMS coordinates.
#[must_use]
pub fn assign_scaled(values: &[f32], scale: f64, boundaries: &[f32]) -> Vec<u8> {
    debug_assert!(
        boundaries.len() < 256,
        "bucket indices must fit in u8, got {} boundaries",
        boundaries.len()
    );

    // SAFETY: bucketize returns at most boundaries.len() (< 256), so the index
    // cast never truncates. The f64 -> f32 narrowing is the intended rounding.
    #[allow(clippy::cast_possible_truncation)]
    values
        .iter()
        .map(|&v| bucketize((f64::from(v) * scale) as f32, boundaries) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARIES: [f32; 3] = [-1.0, 0.0, 1.0];

    #[test]
    fn test_bucketize_interior_values() {
        assert_eq!(bucketize(-5.0, &BOUNDARIES), 0);
        assert_eq!(bucketize(-0.5, &BOUNDARIES), 1);
        assert_eq!(bucketize(0.5, &BOUNDARIES), 2);
        assert_eq!(bucketize(7.0, &BOUNDARIES), 3);
    }

    #[test]
    fn test_bucketize_tie_goes_to_upper_bucket() {
        assert_eq!(bucketize(-1.0, &BOUNDARIES), 1);
        assert_eq!(bucketize(0.0, &BOUNDARIES), 2);
        assert_eq!(bucketize(1.0, &BOUNDARIES), 3);
        // -0.0 == 0.0, so it shares the tie behavior
        assert_eq!(bucketize(-0.0, &BOUNDARIES), 2);
    }

    #[test]
    fn test_bucketize_infinities_and_nan() {
        assert_eq!(bucketize(f32::NEG_INFINITY, &BOUNDARIES), 0);
        assert_eq!(bucketize(f32::INFINITY, &BOUNDARIES), 3);
        assert_eq!(bucketize(f32::NAN, &BOUNDARIES), 0);
    }

    #[test]
    fn test_assign_scaled_matches_manual_scaling() {
        let values = [0.2, -0.7, 0.45, 0.6];
        let scaled: Vec<f32> = values.iter().map(|v| v * 2.0).collect();
        assert_eq!(assign_scaled(&values, 2.0, &BOUNDARIES), assign(&scaled, &BOUNDARIES));
        assert_eq!(assign(&scaled, &BOUNDARIES), vec![2, 0, 2, 3]);
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn test_assign_scaled_factor_beyond_f32_range() {
        // 1e40 overflows f32, but the products are ordinary values.
        let values = [1e-40_f32, -1e-40, 5e-41, -2e-40];
        let factor = 1e40_f64;
        assert!((factor as f32).is_infinite());
        assert_eq!(assign_scaled(&values, factor, &BOUNDARIES), vec![2, 1, 2, 0]);
    }

    #[test]
    fn test_assign_empty() {
        assert!(assign(&[], &BOUNDARIES).is_empty());
    }
}
