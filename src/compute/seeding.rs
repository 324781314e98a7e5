//! Producing seed candidates for the first generation.

use log::debug;
use rand::Rng;

use crate::schema::{Circle, GeneratorConfig, SeedingConfig, SeedingMethod};

use super::{Budget, CircleGenerator, GradientField, generate_rated_circles, prune_rated};

/// Build one seed candidate with exactly `count` circles.
///
/// The chosen method supplies edge-following circles; if it yields more than
/// `count` the best-ranked are kept, if fewer the rest are drawn uniformly
/// with radii in `radius_bounds`.
pub fn seed_candidate<R: Rng + ?Sized>(
    field: &GradientField,
    rng: &mut R,
    count: usize,
    radius_bounds: (f32, f32),
    config: &SeedingConfig,
) -> Vec<Circle> {
    let mut circles = match config.method {
        SeedingMethod::Pruned => {
            let rated = generate_rated_circles(field, rng, config.rated_pool, &config.rated);
            prune_rated(&rated, &config.pruning, rng).circles
        }
        SeedingMethod::Search => CircleGenerator::new(field, config.search.clone()).generate(
            rng,
            Budget::CountOrTime(count, config.search.time_budget),
        ),
    };
    let found = circles.len();
    circles.truncate(count);

    let filler = CircleGenerator::new(field, GeneratorConfig::unconstrained(radius_bounds));
    let circles = filler.extend(rng, circles, Budget::Count(count));
    debug!(
        "Seed candidate: {} edge circles found, {} random added",
        found,
        count.saturating_sub(found)
    );
    circles
}

/// Build `config.num_seeds` seed candidates.
pub fn seed_candidates<R: Rng + ?Sized>(
    field: &GradientField,
    rng: &mut R,
    count: usize,
    radius_bounds: (f32, f32),
    config: &SeedingConfig,
) -> Vec<Vec<Circle>> {
    (0..config.num_seeds)
        .map(|_| seed_candidate(field, rng, count, radius_bounds, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RatedGeneratorConfig, SourceImage, TAG_ACCEPTED};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::Duration;

    fn stripes() -> SourceImage {
        let size = 48;
        let pixels = (0..size * size)
            .map(|i| if (i % size / 6) % 2 == 0 { 230 } else { 10 })
            .collect();
        SourceImage::new(size, size, pixels).unwrap()
    }

    #[test]
    fn test_pruned_seed_has_exact_count() {
        let field = GradientField::new(&stripes());
        let config = SeedingConfig {
            rated_pool: 500,
            rated: RatedGeneratorConfig {
                min_rating: 1.0,
                max_attempts: 50_000,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(5);

        for count in [5, 200] {
            let seed = seed_candidate(&field, &mut rng, count, (0.01, 0.1), &config);
            assert_eq!(seed.len(), count);
        }
        let seed = seed_candidate(&field, &mut rng, 5, (0.01, 0.1), &config);
        assert!(seed.iter().all(|c| c.tag == TAG_ACCEPTED));
    }

    #[test]
    fn test_search_seed_on_flat_image_is_filled() {
        let field = GradientField::new(&SourceImage::uniform(16, 16, 0).unwrap());
        let config = SeedingConfig {
            method: SeedingMethod::Search,
            num_seeds: 3,
            search: GeneratorConfig {
                time_budget: Duration::from_millis(5),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let seeds = seed_candidates(&field, &mut rng, 12, (0.01, 0.1), &config);
        assert_eq!(seeds.len(), 3);
        assert!(seeds.iter().all(|s| s.len() == 12));
    }
}
