use std::fs::File;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::TempDir;
use tiff::encoder::{colortype, TiffEncoder};

use copdem::{Sampler, TileId, TileStore};

const SIZE: u32 = 1200;

/// Create a synthetic Copernicus tile with a simple elevation gradient.
fn create_tile(dir: &std::path::Path, id: TileId) {
    let mut data = vec![0.0f32; (SIZE * SIZE) as usize];
    for row in 0..SIZE as usize {
        for col in 0..SIZE as usize {
            data[row * SIZE as usize + col] = ((row + col) % 4000) as f32;
        }
    }
    let file = File::create(dir.join(id.file_name())).unwrap();
    let mut encoder = TiffEncoder::new(file).unwrap();
    encoder
        .write_image::<colortype::Gray32Float>(SIZE, SIZE, &data)
        .unwrap();
}

fn sampler_over(dir: &TempDir) -> Sampler {
    Sampler::new(Arc::new(TileStore::new(dir.path())))
}

fn bench_single_cached(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    create_tile(tmp.path(), TileId::new(45, 6));
    let sampler = sampler_over(&tmp);

    // Warm the cache
    let _ = sampler.sample(45.5, 6.5);

    c.bench_function("single_cached", |b| {
        b.iter(|| {
            black_box(sampler.sample(black_box(45.9237), black_box(6.8694)));
        });
    });
}

fn bench_single_missing_tile(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let sampler = sampler_over(&tmp);

    c.bench_function("single_missing_tile", |b| {
        b.iter(|| {
            black_box(sampler.sample(black_box(10.0), black_box(10.0)));
        });
    });
}

fn bench_batch_same_tile(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    create_tile(tmp.path(), TileId::new(45, 6));
    let sampler = sampler_over(&tmp);

    // Generate 1000 coords within the same tile
    let coords: Vec<(f64, f64)> = (0..1000)
        .map(|i| {
            let frac = i as f64 / 1000.0;
            (45.0 + frac * 0.99, 6.0 + frac * 0.99)
        })
        .collect();

    // Warm the cache
    let _ = sampler.sample(45.5, 6.5);

    c.bench_function("batch_1000_same_tile", |b| {
        b.iter(|| {
            black_box(sampler.sample_batch(black_box(&coords)));
        });
    });
}

fn bench_batch_multi_tile(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    create_tile(tmp.path(), TileId::new(45, 6));
    create_tile(tmp.path(), TileId::new(46, 6));
    create_tile(tmp.path(), TileId::new(45, 7));
    let sampler = sampler_over(&tmp);

    // Generate 1000 coords spread across 3 tiles
    let coords: Vec<(f64, f64)> = (0..1000)
        .map(|i| match i % 3 {
            0 => (45.0 + (i as f64 / 3000.0) * 0.99, 6.5),
            1 => (46.0 + (i as f64 / 3000.0) * 0.99, 6.5),
            _ => (45.0 + (i as f64 / 3000.0) * 0.99, 7.5),
        })
        .collect();

    // Warm the cache
    let _ = sampler.sample(45.5, 6.5);
    let _ = sampler.sample(46.5, 6.5);
    let _ = sampler.sample(45.5, 7.5);

    c.bench_function("batch_1000_multi_tile", |b| {
        b.iter(|| {
            black_box(sampler.sample_batch(black_box(&coords)));
        });
    });
}

criterion_group!(
    benches,
    bench_single_cached,
    bench_single_missing_tile,
    bench_batch_same_tile,
    bench_batch_multi_tile,
);
criterion_main!(benches);
