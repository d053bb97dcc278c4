use criterion::{black_box, criterion_group, criterion_main, Criterion};

use flywheel_gateway::flywheel::blend;

fn blend_benchmark(c: &mut Criterion) {
    let history: Vec<Vec<f64>> = (0..1000)
        .map(|i| (0..16).map(|j| ((i * 16 + j) % 97) as f64 / 97.0).collect())
        .collect();
    let candidate: Vec<f64> = (0..16).map(|j| j as f64 / 16.0).collect();

    c.bench_function("blend 1000x16", |b| {
        b.iter(|| blend(black_box(&candidate), black_box(&history), 0.5))
    });
}

criterion_group!(benches, blend_benchmark);
criterion_main!(benches);
