use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use optanalytics::config::DistributionConfig;
use optanalytics::distribution::DistributionInput;
use optanalytics::{SurfaceBuilder, SurfacePoint};

/// Synthetic skewed smile observations across `n_expiries` maturities.
fn generate_points(n_expiries: usize, n_strikes: usize) -> Vec<SurfacePoint> {
    (1..=n_expiries)
        .flat_map(|i| {
            let days = 7.0 * i as f64;
            (0..n_strikes).map(move |j| {
                let x = -0.6 + 1.2 * j as f64 / (n_strikes - 1) as f64;
                let noise = 0.005 * ((j * 7 + i * 3) % 5) as f64;
                SurfacePoint::new(x, days, 0.25 - 0.1 * x + 0.4 * x * x + noise)
            })
        })
        .collect()
}

fn surface_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("surface");

    let small = generate_points(5, 40);
    group.bench_function("surface_5_expiries_60_steps", |b| {
        b.iter(|| {
            SurfaceBuilder::new()
                .add_points(black_box(small.iter().copied()))
                .build()
                .unwrap()
        })
    });

    let large = generate_points(25, 200);
    group.bench_function("surface_25_expiries_120_steps", |b| {
        b.iter(|| {
            SurfaceBuilder::new()
                .x_steps(120)
                .add_points(black_box(large.iter().copied()))
                .build()
                .unwrap()
        })
    });

    group.bench_function("surface_empty", |b| {
        b.iter(|| SurfaceBuilder::new().build().unwrap())
    });

    group.finish();
}

fn distribution_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("distribution");
    let cfg = DistributionConfig::default();
    let input = DistributionInput::new(100.0, 0.03, 0.01, 0.25, 0.22);

    group.bench_function("lognormal_260_points", |b| {
        b.iter(|| black_box(&input).build(&cfg).unwrap())
    });

    group.finish();
}

criterion_group!(benches, surface_benchmarks, distribution_benchmarks);
criterion_main!(benches);
