//! Stochastic circle proposal against an image's edge structure.
//!
//! Circles are drawn uniformly at random and kept only if they track an edge
//! and keep their distance from the circles accepted before them.

use std::time::{Duration, Instant};

use log::{debug, warn};
use rand::Rng;

use crate::schema::{Circle, GeneratorConfig, RatedCircle, RatedGeneratorConfig};

use super::{GradientField, max_overlap_with, min_distance_to};

/// When circle generation stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// Keep drawing until this many circles are accepted.
    Count(usize),
    /// Keep drawing until the wall-clock budget is spent.
    Time(Duration),
    /// Stop at whichever limit is reached first.
    CountOrTime(usize, Duration),
}

/// Why a proposed circle was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Rating,
    Overlap,
    Distance,
    TotalScore,
}

/// Rejection sampler for circles rated against a [`GradientField`].
pub struct CircleGenerator<'a> {
    field: &'a GradientField,
    config: GeneratorConfig,
}

impl<'a> CircleGenerator<'a> {
    pub fn new(field: &'a GradientField, config: GeneratorConfig) -> Self {
        Self { field, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Check a circle against all four thresholds given the circles accepted so far.
    pub fn check(&self, circle: &Circle, accepted: &[Circle]) -> Result<(), Rejection> {
        let rating = self.field.rate_circle(circle);
        if !(rating > self.config.min_rating) {
            return Err(Rejection::Rating);
        }
        let overlap = max_overlap_with(circle, accepted);
        if !(overlap < self.config.max_overlap) {
            return Err(Rejection::Overlap);
        }
        let distance = min_distance_to(circle, accepted);
        if !(distance > self.config.min_distance) {
            return Err(Rejection::Distance);
        }
        if !(rating * (1.0 - overlap) * distance > self.config.min_total_score) {
            return Err(Rejection::TotalScore);
        }
        Ok(())
    }

    /// Draw one random circle and return it if it passes [`Self::check`].
    pub fn propose<R: Rng + ?Sized>(&self, rng: &mut R, accepted: &[Circle]) -> Option<Circle> {
        let (min_radius, max_radius) = self.config.radius_bounds;
        let circle = Circle::random(rng, min_radius, max_radius);
        self.check(&circle, accepted).ok().map(|_| circle)
    }

    /// Generate circles until the budget is exhausted.
    ///
    /// Time-bounded runs may return fewer circles than hoped for, including
    /// none at all. Count-bounded runs only return once the count is met.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R, budget: Budget) -> Vec<Circle> {
        self.extend(rng, Vec::new(), budget)
    }

    /// Like [`Self::generate`] but starting from circles that are already placed.
    ///
    /// The starting circles are included in the returned list and count
    /// towards a [`Budget::Count`].
    pub fn extend<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        mut accepted: Vec<Circle>,
        budget: Budget,
    ) -> Vec<Circle> {
        let start = Instant::now();
        let (target, deadline) = match budget {
            Budget::Count(n) => (Some(n), None),
            Budget::Time(t) => (None, Some(t)),
            Budget::CountOrTime(n, t) => (Some(n), Some(t)),
        };
        let mut attempts = 0u64;

        loop {
            if target.is_some_and(|n| accepted.len() >= n) {
                break;
            }
            if deadline.is_some_and(|t| start.elapsed() >= t) {
                if let Some(n) = target {
                    warn!(
                        "Circle generation ran out of time with {}/{} circles",
                        accepted.len(),
                        n
                    );
                }
                break;
            }

            attempts += 1;
            if let Some(circle) = self.propose(rng, &accepted) {
                accepted.push(circle);
            }
        }

        debug!(
            "Generated {} circles in {} attempts ({:.2}s)",
            accepted.len(),
            attempts,
            start.elapsed().as_secs_f32()
        );
        accepted
    }
}

/// Size-bucket index of a radius within `bounds`, in `0..num_buckets`.
pub fn size_bucket(radius: f32, bounds: (f32, f32), num_buckets: u32) -> u32 {
    let span = bounds.1 - bounds.0;
    if span <= 0.0 || num_buckets == 0 {
        return 0;
    }
    let bucket = ((radius - bounds.0) * num_buckets as f32 / span).floor();
    (bucket.max(0.0) as u32).min(num_buckets - 1)
}

/// Draw circles whose pure rating exceeds the threshold and attach a
/// rating that also rewards larger radii, to spread sizes after pruning.
///
/// Stops after `count` circles or `config.max_attempts` draws.
pub fn generate_rated_circles<R: Rng + ?Sized>(
    field: &GradientField,
    rng: &mut R,
    count: usize,
    config: &RatedGeneratorConfig,
) -> Vec<RatedCircle> {
    let (min_radius, max_radius) = config.radius_bounds;
    let mut circles = Vec::with_capacity(count);
    let mut attempts = 0u64;

    while circles.len() < count && attempts < config.max_attempts {
        attempts += 1;
        let circle = Circle::random(rng, min_radius, max_radius);
        let rating = field.rate_circle(&circle);
        if rating > config.min_rating {
            let bucket = size_bucket(circle.radius, config.radius_bounds, config.num_size_buckets);
            circles.push(RatedCircle::new(
                circle,
                rating + bucket as f32 * config.bucket_weight,
            ));
        }
    }

    if circles.len() < count {
        warn!(
            "Only {}/{} rated circles after {} attempts",
            circles.len(),
            count,
            attempts
        );
    }
    circles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{distance_squared, overlap_percentage};
    use crate::schema::SourceImage;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Image with concentric bright/dark rings so that many circles find edges.
    fn ring_image(size: usize) -> SourceImage {
        let mut pixels = vec![0u8; size * size];
        for y in 0..size {
            for x in 0..size {
                let fx = (x as f32 + 0.5) / size as f32 - 0.5;
                let fy = (y as f32 + 0.5) / size as f32 - 0.5;
                let r = (fx * fx + fy * fy).sqrt();
                if ((r * 20.0) as u32) % 2 == 0 {
                    pixels[y * size + x] = 255;
                }
            }
        }
        SourceImage::new(size, size, pixels).unwrap()
    }

    #[test]
    fn test_unconstrained_count_is_exact() {
        let field = GradientField::new(&SourceImage::uniform(32, 32, 10).unwrap());
        let generator = CircleGenerator::new(&field, GeneratorConfig::unconstrained((0.01, 0.1)));
        let mut rng = StdRng::seed_from_u64(3);

        let circles = generator.generate(&mut rng, Budget::Count(25));
        assert_eq!(circles.len(), 25);
        assert!(circles.iter().all(|c| c.radius >= 0.01 && c.radius <= 0.1));
    }

    #[test]
    fn test_extend_keeps_existing() {
        let field = GradientField::new(&SourceImage::uniform(16, 16, 10).unwrap());
        let generator = CircleGenerator::new(&field, GeneratorConfig::unconstrained((0.01, 0.1)));
        let mut rng = StdRng::seed_from_u64(3);
        let existing = vec![Circle::new(0.5, 0.5, 0.2)];

        let circles = generator.extend(&mut rng, existing.clone(), Budget::Count(4));
        assert_eq!(circles.len(), 4);
        assert_eq!(circles[0], existing[0]);
    }

    #[test]
    fn test_flat_image_rejects_on_rating() {
        let field = GradientField::new(&SourceImage::uniform(32, 32, 10).unwrap());
        let generator = CircleGenerator::new(&field, GeneratorConfig::default());
        assert_eq!(
            generator.check(&Circle::new(0.5, 0.5, 0.1), &[]),
            Err(Rejection::Rating)
        );

        let mut rng = StdRng::seed_from_u64(1);
        let circles = generator.generate(&mut rng, Budget::Time(Duration::from_millis(20)));
        assert!(circles.is_empty());
    }

    #[test]
    fn test_time_budget_respects_thresholds() {
        let field = GradientField::new(&ring_image(64));
        let config = GeneratorConfig {
            min_rating: 2.0,
            max_overlap: 0.3,
            min_distance: 0.02,
            ..Default::default()
        };
        let generator = CircleGenerator::new(&field, config.clone());
        let mut rng = StdRng::seed_from_u64(11);

        let circles = generator.generate(&mut rng, Budget::Time(Duration::from_millis(200)));
        for (i, a) in circles.iter().enumerate() {
            assert!(field.rate_circle(a) > config.min_rating);
            for b in &circles[..i] {
                assert!(overlap_percentage(a, b) < config.max_overlap);
                assert!(distance_squared(a, b).sqrt() > config.min_distance);
            }
        }
    }

    #[test]
    fn test_count_or_time_stops_on_time() {
        let field = GradientField::new(&SourceImage::uniform(16, 16, 0).unwrap());
        let generator = CircleGenerator::new(&field, GeneratorConfig::default());
        let mut rng = StdRng::seed_from_u64(5);
        let circles = generator.generate(
            &mut rng,
            Budget::CountOrTime(10, Duration::from_millis(10)),
        );
        assert!(circles.is_empty());
    }

    #[test]
    fn test_size_bucket() {
        assert_eq!(size_bucket(0.005, (0.005, 0.1), 10), 0);
        assert_eq!(size_bucket(0.1, (0.005, 0.1), 10), 9);
        assert_eq!(size_bucket(0.06, (0.005, 0.1), 10), 5);
        assert_eq!(size_bucket(0.05, (0.05, 0.05), 10), 0);
    }

    #[test]
    fn test_rated_circles_carry_bucket_bonus() {
        let field = GradientField::new(&ring_image(64));
        let config = RatedGeneratorConfig {
            min_rating: 1.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(9);
        let rated = generate_rated_circles(&field, &mut rng, 50, &config);

        assert_eq!(rated.len(), 50);
        for rc in &rated {
            let pure = field.rate_circle(&rc.circle);
            let bucket = size_bucket(rc.circle.radius, config.radius_bounds, config.num_size_buckets);
            assert!(pure > config.min_rating);
            assert!((rc.rating - (pure + bucket as f32 * config.bucket_weight)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_rated_circles_give_up_after_attempts() {
        let field = GradientField::new(&SourceImage::uniform(16, 16, 0).unwrap());
        let config = RatedGeneratorConfig {
            max_attempts: 100,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(9);
        assert!(generate_rated_circles(&field, &mut rng, 5, &config).is_empty());
    }
}
