//! Benchmarks for the normalization and classification hot path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use seshat::classify::classify;
use seshat::normalize::normalize;

const INPUTS: &[&str] = &[
    "2 + 3 * 4",
    "diff(x**2, x)",
    "производная x^2 + 3x",
    "предел sin(x)/x при x->0",
    "интеграл x^2 dx",
    "solve(x**2 - 4, x)",
];

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_mixed", |bench| {
        bench.iter(|| {
            for input in INPUTS {
                black_box(normalize(black_box(input)));
            }
        })
    });
}

fn bench_classify(c: &mut Criterion) {
    c.bench_function("classify_mixed", |bench| {
        bench.iter(|| {
            for input in INPUTS {
                black_box(classify(black_box(input)));
            }
        })
    });
}

fn bench_full_front_half(c: &mut Criterion) {
    c.bench_function("normalize_and_classify", |bench| {
        bench.iter(|| {
            for input in INPUTS {
                let normalized = normalize(black_box(input));
                black_box((normalized, classify(input)));
            }
        })
    });
}

criterion_group!(benches, bench_normalize, bench_classify, bench_full_front_half);
criterion_main!(benches);
