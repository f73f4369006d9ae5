//! Scenario tests on seeded Gaussian vectors, the input DRIVE expects after
//! a random rotation.

#![allow(clippy::cast_precision_loss)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use drive_core::{
    CodebookCache, DriveCode, DriveConfig, DrivePipeline, DriveStage, IdentityRotation, Transform,
};

const DIM: usize = 4096;

fn gaussian(seed: u64, len: usize, std_dev: f32) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0_f32, std_dev).unwrap();
    (0..len).map(|_| normal.sample(&mut rng)).collect()
}

fn energy(v: &[f32]) -> f64 {
    v.iter().map(|&x| f64::from(x).powi(2)).sum()
}

fn relative_error(x: &[f32], approx: &[f32]) -> f64 {
    let diff: f64 = x
        .iter()
        .zip(approx)
        .map(|(&a, &b)| (f64::from(a) - f64::from(b)).powi(2))
        .sum();
    (diff / energy(x)).sqrt()
}

#[test]
fn bias_corrected_energy_tracks_input_energy() {
    let cache = CodebookCache::new();
    let x = gaussian(7, DIM, 0.01);
    let original = energy(&x);

    for bits in 2..=8_u8 {
        let stage = DriveStage::new(&DriveConfig::new(bits), &cache).unwrap();
        let decoded = stage.decode(&stage.encode(&x).unwrap()).unwrap();
        let ratio = energy(&decoded) / original;
        let tolerance = match bits {
            2 => 0.20,
            3 => 0.08,
            _ => 0.03,
        };
        assert!(
            (ratio - 1.0).abs() < tolerance,
            "bits={bits}: energy ratio {ratio} outside ±{tolerance}"
        );
    }
}

#[test]
fn energy_is_stable_across_repeated_runs() {
    let cache = CodebookCache::new();
    let stage = DriveStage::new(&DriveConfig::new(3), &cache).unwrap();
    let x = gaussian(11, DIM, 1.0);

    let first = energy(&stage.decode(&stage.encode(&x).unwrap()).unwrap());
    for _ in 0..3 {
        let again = energy(&stage.decode(&stage.encode(&x).unwrap()).unwrap());
        assert!((again - first).abs() <= 1e-9 * first);
    }
}

#[test]
fn reconstruction_error_shrinks_with_bits() {
    let cache = CodebookCache::new();
    let x = gaussian(23, DIM, 2.0);

    let errors: Vec<f64> = (1..=8_u8)
        .map(|bits| {
            let config = DriveConfig::new(bits).with_bias_correction(false);
            let stage = DriveStage::new(&config, &cache).unwrap();
            relative_error(&x, &stage.decode(&stage.encode(&x).unwrap()).unwrap())
        })
        .collect();

    for (k, pair) in errors.windows(2).enumerate() {
        assert!(
            pair[1] < pair[0],
            "error did not shrink from {} to {} bits: {errors:?}",
            k + 1,
            k + 2
        );
    }
    assert!(errors[7] < 0.02, "8-bit error too large: {}", errors[7]);
}

#[test]
fn one_bit_bias_correction_is_unbiased_in_projection() {
    let cache = CodebookCache::new();
    let stage = DriveStage::new(&DriveConfig::new(1), &cache).unwrap();
    let x = gaussian(3, DIM, 0.5);

    let decoded = stage.decode(&stage.encode(&x).unwrap()).unwrap();
    let dot: f64 = x
        .iter()
        .zip(&decoded)
        .map(|(&a, &b)| f64::from(a) * f64::from(b))
        .sum();
    let expected = energy(&x);
    assert!(((dot - expected) / expected).abs() < 1e-5);
}

#[test]
fn clamping_bounds_reconstruction_of_spiky_vector() {
    let cache = CodebookCache::new();
    let mut x = gaussian(5, DIM, 1.0);
    x[100] = 400.0;

    let plain = DriveStage::new(&DriveConfig::new(4), &cache).unwrap();
    let clamped =
        DriveStage::new(&DriveConfig::new(4).with_std_outlier_factor(3.0), &cache).unwrap();

    let plain_out = plain.decode(&plain.encode(&x).unwrap()).unwrap();
    let clamped_out = clamped.decode(&clamped.encode(&x).unwrap()).unwrap();

    // Error on the bulk of the vector (everything but the spike).
    let bulk = |approx: &[f32]| {
        let mut xs = x.clone();
        let mut ys = approx.to_vec();
        xs.remove(100);
        ys.remove(100);
        relative_error(&xs, &ys)
    };
    assert!(bulk(&clamped_out) < bulk(&plain_out));
    assert!(clamped_out[100] < 400.0);
}

#[test]
fn batched_gradients_shipped_over_the_wire() {
    let cache = CodebookCache::new();
    let rows = 16;
    let row_len = 256;
    let batch: Vec<f32> = (0..rows)
        .flat_map(|r| gaussian(100, row_len, 0.1 * (r + 1) as f32))
        .collect();

    let stage = DriveStage::new(&DriveConfig::new(4).with_row_len(row_len), &cache).unwrap();
    let code = stage.encode(&batch).unwrap();
    assert_eq!(code.rows(), rows);
    // Same draws at growing magnitude, so scales grow with the row.
    for pair in code.scales().windows(2) {
        assert!(pair[0] < pair[1]);
    }

    let bytes = code.to_bytes();
    assert_eq!(bytes.len(), 9 + 4 * rows + rows * row_len / 2);

    let received = DriveCode::from_bytes(&bytes).unwrap();
    let decoded = stage.decode(&received).unwrap();
    assert!(relative_error(&batch, &decoded) < 0.15);
}

#[test]
fn pipeline_transform_roundtrip() {
    let cache = CodebookCache::new();
    let stage = DriveStage::new(&DriveConfig::new(8), &cache).unwrap();
    let pipeline = DrivePipeline::new(IdentityRotation, stage);
    let x = gaussian(42, 1024, 3.0);

    let decoded = pipeline.backward(&pipeline.forward(&x).unwrap()).unwrap();
    assert!(relative_error(&x, &decoded) < 0.02);
}
