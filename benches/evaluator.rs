//! Benchmarks for circle list evaluation.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use bubbles::{
    compute::{CoverageIndex, FitnessEvaluator, SegmentMap},
    schema::{Circle, EvaluationConfig, SourceImage},
};

fn gradient_image(size: usize) -> SourceImage {
    let pixels = (0..size * size)
        .map(|i| {
            let (x, y) = (i % size, i / size);
            ((x + y) * 255 / (2 * size)) as u8
        })
        .collect();
    SourceImage::new(size, size, pixels).unwrap()
}

fn random_circles(count: usize) -> Vec<Circle> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| Circle::random(&mut rng, 0.01, 0.1))
        .collect()
}

fn bench_coverage(c: &mut Criterion) {
    let mut group = c.benchmark_group("coverage_index");
    let circles = random_circles(600);

    for size in [64, 128, 256, 512] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size, size)),
            &size,
            |b, &size| {
                b.iter(|| CoverageIndex::build(black_box(&circles), size, size));
            },
        );
    }

    group.finish();
}

fn bench_segments(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_map");
    let circles = random_circles(600);

    for size in [64, 128, 256] {
        let image = gradient_image(size);
        let index = CoverageIndex::build(&circles, size, size);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size, size)),
            &size,
            |b, _| {
                b.iter(|| SegmentMap::build(black_box(&index), &image, 51));
            },
        );
    }

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    group.sample_size(20);

    for count in [100, 600, 2000] {
        let circles = random_circles(count);
        let evaluator =
            FitnessEvaluator::new(Arc::new(gradient_image(256)), EvaluationConfig::default())
                .unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{} circles", count)),
            &count,
            |b, _| {
                b.iter(|| evaluator.evaluate(black_box(&circles)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_coverage, bench_segments, bench_evaluate);
criterion_main!(benches);
