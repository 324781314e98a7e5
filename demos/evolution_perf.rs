//! Quick evolution performance test

use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;

use bubbles::{
    EvolutionConfig, EvolutionEngine,
    compute::{GradientField, seed_candidates},
    schema::{PopulationConfig, SeedingConfig, SourceImage},
};

/// Concentric rings, which give the edge rating something to follow.
fn rings_image(size: usize) -> SourceImage {
    let pixels = (0..size * size)
        .map(|i| {
            let dx = (i % size) as f32 / size as f32 - 0.5;
            let dy = (i / size) as f32 / size as f32 - 0.5;
            let ring = ((dx * dx + dy * dy).sqrt() * 12.0) as usize;
            if ring % 2 == 0 { 220 } else { 30 }
        })
        .collect();
    SourceImage::new(size, size, pixels).expect("non-empty image")
}

fn run(size: usize, population: usize, circles: usize, generations: usize) {
    let image = Arc::new(rings_image(size));
    let config = EvolutionConfig {
        population: PopulationConfig {
            size: population,
            max_generations: generations,
            target_fitness: None,
            ..Default::default()
        },
        circles_per_candidate: circles,
        random_seed: Some(42),
        ..Default::default()
    };
    let seeding = SeedingConfig {
        num_seeds: population,
        rated_pool: circles * 4,
        ..Default::default()
    };

    let start = Instant::now();
    let field = GradientField::new(&image);
    let mut rng = StdRng::seed_from_u64(7);
    let seeds = seed_candidates(&field, &mut rng, circles, config.radius_bounds, &seeding);
    let seed_time = start.elapsed();

    let start = Instant::now();
    let mut engine = EvolutionEngine::new(config, image).expect("valid config");
    engine.load_first_generation(seeds).expect("enough seeds");
    let result = engine.run().expect("loaded engine");
    let elapsed = start.elapsed();

    let total_evals = result.stats.total_evaluations;
    let evals_per_sec = total_evals as f64 / elapsed.as_secs_f64();

    println!("  Seeding:        {:.2}s", seed_time.as_secs_f64());
    println!("  Generations:    {}", result.stats.generations);
    println!("  Evaluations:    {}", total_evals);
    println!("  Elapsed:        {:.2}s", elapsed.as_secs_f64());
    println!("  Evals/sec:      {:.1}", evals_per_sec);
    println!("  Best fitness:   {:.4}", result.stats.best_fitness);
    println!("  Best error:     {:.3}", result.best.summary.error);
    println!();
}

fn main() {
    println!("=== Evolution Performance Test ===\n");

    for size in [64, 128, 256] {
        println!("Image size: {}x{}", size, size);
        run(size, 20, 200, 5);
    }

    println!("=== Scalability Test (fixed 128x128 image) ===\n");

    for circles in [100, 300, 600] {
        println!("Circles per candidate: {}", circles);
        run(128, 20, circles, 3);
    }
}
