//! Composition of a rotation step with the DRIVE quantization stage.
//!
//! DRIVE assumes its input has already been rotated by a randomized
//! orthogonal transform so coordinates look roughly Gaussian. The rotation
//! itself is supplied by the caller through [`Rotation`]; [`DrivePipeline`]
//! only sequences `rotate -> encode` and `decode -> unrotate`.

use crate::error::{Error, Result};
use crate::quantization::{DriveCode, DriveStage};

/// A reversible transform from a vector to an encoded form.
pub trait Transform {
    /// Encoded representation produced by [`Transform::forward`].
    type Encoded;

    /// Encodes `x`.
    fn forward(&self, x: &[f32]) -> Result<Self::Encoded>;

    /// Reconstructs an approximation of the original input.
    fn backward(&self, encoded: &Self::Encoded) -> Result<Vec<f32>>;
}

impl Transform for DriveStage {
    type Encoded = DriveCode;

    fn forward(&self, x: &[f32]) -> Result<DriveCode> {
        self.encode(x)
    }

    fn backward(&self, encoded: &DriveCode) -> Result<Vec<f32>> {
        self.decode(encoded)
    }
}

/// A length-preserving, norm-preserving linear map and its inverse.
pub trait Rotation: Send + Sync {
    /// Applies the rotation.
    fn rotate(&self, x: &[f32]) -> Vec<f32>;

    /// Applies the inverse rotation.
    fn unrotate(&self, y: &[f32]) -> Vec<f32>;
}

/// Rotation that leaves vectors untouched. Use when the caller has already
/// rotated its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityRotation;

impl Rotation for IdentityRotation {
    fn rotate(&self, x: &[f32]) -> Vec<f32> {
        x.to_vec()
    }

    fn unrotate(&self, y: &[f32]) -> Vec<f32> {
        y.to_vec()
    }
}

/// A rotation followed by a DRIVE stage.
#[derive(Debug, Clone)]
pub struct DrivePipeline<R> {
    rotation: R,
    stage: DriveStage,
}

impl<R: Rotation> DrivePipeline<R> {
    /// Pairs `rotation` with `stage`.
    #[must_use]
    pub fn new(rotation: R, stage: DriveStage) -> Self {
        Self { rotation, stage }
    }

    /// Rotation component.
    #[must_use]
    pub fn rotation(&self) -> &R {
        &self.rotation
    }

    /// Quantization component.
    #[must_use]
    pub fn stage(&self) -> &DriveStage {
        &self.stage
    }
}

impl<R: Rotation> Transform for DrivePipeline<R> {
    type Encoded = DriveCode;

    fn forward(&self, x: &[f32]) -> Result<DriveCode> {
        let rotated = self.rotation.rotate(x);
        if rotated.len() != x.len() {
            return Err(Error::DimensionMismatch {
                expected: x.len(),
                actual: rotated.len(),
            });
        }
        self.stage.encode(&rotated)
    }

    fn backward(&self, encoded: &DriveCode) -> Result<Vec<f32>> {
        let decoded = self.stage.decode(encoded)?;
        Ok(self.rotation.unrotate(&decoded))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]

    use super::*;
    use crate::codebook::CodebookCache;
    use crate::config::DriveConfig;

    /// Flips the sign of every other coordinate: orthogonal and self-inverse.
    struct AlternatingSigns;

    impl Rotation for AlternatingSigns {
        fn rotate(&self, x: &[f32]) -> Vec<f32> {
            x.iter()
                .enumerate()
                .map(|(i, &v)| if i % 2 == 0 { v } else { -v })
                .collect()
        }

        fn unrotate(&self, y: &[f32]) -> Vec<f32> {
            self.rotate(y)
        }
    }

    /// Drops the last coordinate, breaking the length contract.
    struct Truncating;

    impl Rotation for Truncating {
        fn rotate(&self, x: &[f32]) -> Vec<f32> {
            x[..x.len() - 1].to_vec()
        }

        fn unrotate(&self, y: &[f32]) -> Vec<f32> {
            y.to_vec()
        }
    }

    fn stage(bits: u8) -> DriveStage {
        DriveStage::new(&DriveConfig::new(bits), &CodebookCache::new()).unwrap()
    }

    #[test]
    fn test_identity_pipeline_matches_stage() {
        let x = [0.4_f32, -1.1, 2.5, 0.0, -0.3, 0.9];
        let pipeline = DrivePipeline::new(IdentityRotation, stage(4));
        let code = pipeline.forward(&x).unwrap();
        assert_eq!(code, pipeline.stage().forward(&x).unwrap());
        assert_eq!(
            pipeline.backward(&code).unwrap(),
            pipeline.stage().backward(&code).unwrap()
        );
    }

    #[test]
    fn test_rotation_is_applied_and_inverted() {
        let x = [1.0_f32, 1.0, -2.0, -2.0];
        let pipeline = DrivePipeline::new(AlternatingSigns, stage(1));

        let code = pipeline.forward(&x).unwrap();
        // rotated input is [1, -1, -2, 2]
        assert_eq!(code.signs(), Some(&[true, false, false, true][..]));

        let decoded = pipeline.backward(&code).unwrap();
        for (orig, rec) in x.iter().zip(&decoded) {
            assert_eq!(orig.signum(), rec.signum());
        }
    }

    #[test]
    fn test_length_changing_rotation_rejected() {
        let pipeline = DrivePipeline::new(Truncating, stage(2));
        assert_eq!(
            pipeline.forward(&[1.0, 2.0, 3.0]).unwrap_err(),
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        );
    }
}
