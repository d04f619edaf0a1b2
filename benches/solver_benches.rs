use criterion::{Criterion, criterion_group, criterion_main};
use packwise::optimizer::{PackingConfig, calculate, calculate_with_config};
use std::hint::black_box;

const DEFAULT_SIZES: [i64; 5] = [250, 500, 1000, 2000, 5000];
const COPRIME_SIZES: [i64; 3] = [23, 31, 53];

fn bench_default_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("calculate/default_sizes");
    for (name, quantity) in [("small", 12_001i64), ("medium", 100_000), ("large", 500_000)] {
        group.bench_function(name, |b| {
            b.iter(|| calculate(black_box(quantity), black_box(&DEFAULT_SIZES)).unwrap())
        });
    }
    group.finish();
}

fn bench_without_scaling(c: &mut Criterion) {
    let config = PackingConfig::builder().gcd_scaling(false).build();
    c.bench_function("calculate/unscaled_500k", |b| {
        b.iter(|| {
            calculate_with_config(black_box(500_000), black_box(&DEFAULT_SIZES), &config).unwrap()
        })
    });
}

fn bench_coprime_sizes(c: &mut Criterion) {
    c.bench_function("calculate/coprime_500k", |b| {
        b.iter(|| calculate(black_box(500_000), black_box(&COPRIME_SIZES)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_default_sizes,
    bench_without_scaling,
    bench_coprime_sizes
);
criterion_main!(benches);
