//! Benchmarks for DRIVE encode/decode across bit-widths and reduction modes.
//!
//! Measures:
//! - Whole-vector encode and decode for 1, 2, 4 and 8 bits
//! - Row-wise encode of a batch (parallel when the `parallel` feature is on)
//! - Wire serialization of an encoded batch

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use drive_core::{CodebookCache, DriveCode, DriveConfig, DriveStage};

const BITS: [u8; 4] = [1, 2, 4, 8];

fn gaussian(len: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(42);
    let normal = Normal::new(0.0_f32, 1.0).unwrap();
    (0..len).map(|_| normal.sample(&mut rng)).collect()
}

// =============================================================================
// Whole-vector
// =============================================================================

fn bench_encode(c: &mut Criterion) {
    let cache = CodebookCache::new();
    let mut group = c.benchmark_group("drive_encode");

    for dim in [1024_usize, 65_536] {
        let x = gaussian(dim);
        group.throughput(Throughput::Elements(dim as u64));
        for bits in BITS {
            let stage = DriveStage::new(&DriveConfig::new(bits), &cache).unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("{bits}bit"), dim),
                &x,
                |b, x| b.iter(|| black_box(stage.encode(black_box(x)).unwrap())),
            );
        }
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let cache = CodebookCache::new();
    let mut group = c.benchmark_group("drive_decode");
    let dim = 65_536_usize;
    let x = gaussian(dim);
    group.throughput(Throughput::Elements(dim as u64));

    for bits in BITS {
        let stage = DriveStage::new(&DriveConfig::new(bits), &cache).unwrap();
        let code = stage.encode(&x).unwrap();
        group.bench_with_input(BenchmarkId::new("bits", bits), &code, |b, code| {
            b.iter(|| black_box(stage.decode(black_box(code)).unwrap()));
        });
    }
    group.finish();
}

// =============================================================================
// Row-wise batches
// =============================================================================

fn bench_row_wise(c: &mut Criterion) {
    let cache = CodebookCache::new();
    let mut group = c.benchmark_group("drive_row_wise");
    let row_len = 1024_usize;
    let rows = 256_usize;
    let batch = gaussian(rows * row_len);
    group.throughput(Throughput::Elements((rows * row_len) as u64));

    for bits in [2_u8, 4] {
        let config = DriveConfig::new(bits)
            .with_std_outlier_factor(3.0)
            .with_row_len(row_len);
        let stage = DriveStage::new(&config, &cache).unwrap();
        group.bench_with_input(BenchmarkId::new("encode", bits), &batch, |b, batch| {
            b.iter(|| black_box(stage.encode(black_box(batch)).unwrap()));
        });
    }
    group.finish();
}

fn bench_wire(c: &mut Criterion) {
    let cache = CodebookCache::new();
    let stage = DriveStage::new(&DriveConfig::new(4).with_row_len(1024), &cache).unwrap();
    let code = stage.encode(&gaussian(64 * 1024)).unwrap();
    let bytes = code.to_bytes();

    c.bench_function("drive_to_bytes_4bit", |b| {
        b.iter(|| black_box(black_box(&code).to_bytes()));
    });
    c.bench_function("drive_from_bytes_4bit", |b| {
        b.iter(|| black_box(DriveCode::from_bytes(black_box(&bytes)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_row_wise,
    bench_wire
);
criterion_main!(benches);
