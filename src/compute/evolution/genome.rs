//! Variation operators for circle-list candidates.
//!
//! Provides parent recombination, circle jitter and top-up with fresh
//! random circles.

use rand::prelude::*;
use rand::distributions::Uniform;

use crate::compute::{Point, point_distance_squared};
use crate::schema::{Circle, CrossoverMethod, GeneticAlgorithmConfig, MutationKernel};

/// Random number generator wrapper for candidate variation.
pub struct CircleRng {
    rng: StdRng,
}

impl CircleRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Direct access to the underlying generator.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Uniform draw in `[0, 1)`.
    pub fn unit(&mut self) -> f32 {
        self.rng.r#gen::<f32>()
    }

    /// `n` uniformly random anchor points in the unit square.
    pub fn anchors(&mut self, n: usize) -> Vec<Point> {
        (0..n)
            .map(|_| (self.rng.r#gen::<f32>(), self.rng.r#gen::<f32>()))
            .collect()
    }

    /// Add bounded random noise to a circle's position and radius.
    pub fn jitter(&mut self, circle: Circle, max: f32, kernel: MutationKernel) -> Circle {
        if max <= 0.0 {
            return circle;
        }
        let mut draw = || match kernel {
            MutationKernel::Uniform => self.rng.sample(Uniform::new_inclusive(-max, max)),
            MutationKernel::Gaussian => {
                let noise: f32 = self.rng.sample(rand_distr::StandardNormal);
                (noise * max * 0.5).clamp(-max, max)
            }
        };
        let (dx, dy, dr) = (draw(), draw(), draw());
        circle.offset(dx, dy, dr)
    }

    /// Recombine parents into a child with exactly `circles_per_candidate` circles.
    ///
    /// Inherited circles are shuffled, at most
    /// `circles_per_candidate - circles_randomized` are kept, the first
    /// `circles_mutated` of those are jittered, and the rest are fresh
    /// untagged circles with radii in `radius_bounds`.
    pub fn make_child(
        &mut self,
        parents: &[&[Circle]],
        circles_per_candidate: usize,
        radius_bounds: (f32, f32),
        config: &GeneticAlgorithmConfig,
    ) -> Vec<Circle> {
        let mut pool = match config.crossover {
            CrossoverMethod::Voronoi => {
                let anchors = self.anchors(parents.len());
                voronoi_inherit(parents, &anchors)
            }
            CrossoverMethod::RandomSubset => pool_parents(parents),
        };

        let num_random = config
            .circles_randomized
            .max(circles_per_candidate.saturating_sub(pool.len()));
        pool.shuffle(&mut self.rng);
        pool.truncate(circles_per_candidate.saturating_sub(num_random));

        let mutated = config.circles_mutated.min(pool.len());
        for circle in &mut pool[..mutated] {
            *circle = self.jitter(*circle, config.max_mutation, config.mutation_kernel);
        }

        let (min_radius, max_radius) = radius_bounds;
        let shortfall = circles_per_candidate - pool.len();
        pool.extend((0..shortfall).map(|_| Circle::random(&mut self.rng, min_radius, max_radius)));
        pool
    }
}

/// Tag marking a circle as inherited from parent `index`.
#[inline]
pub fn parent_tag(index: usize) -> u32 {
    index as u32 + 1
}

/// Voronoi crossover: parent `p` contributes the circles whose center has no
/// anchor strictly closer than `anchors[p]`.
///
/// Circles equidistant from several nearest anchors are inherited from each of
/// those parents. Inherited circles are tagged with [`parent_tag`].
pub fn voronoi_inherit(parents: &[&[Circle]], anchors: &[Point]) -> Vec<Circle> {
    debug_assert_eq!(parents.len(), anchors.len());

    parents
        .iter()
        .zip(anchors)
        .enumerate()
        .flat_map(|(p, (circles, &anchor))| {
            circles.iter().filter_map(move |c| {
                let own = point_distance_squared(c.center(), anchor);
                let owned = anchors
                    .iter()
                    .enumerate()
                    .all(|(q, &other)| q == p || point_distance_squared(c.center(), other) >= own);
                owned.then(|| c.with_tag(parent_tag(p)))
            })
        })
        .collect()
}

/// Every circle of every parent, tagged by parent.
pub fn pool_parents(parents: &[&[Circle]]) -> Vec<Circle> {
    parents
        .iter()
        .enumerate()
        .flat_map(|(p, circles)| circles.iter().map(move |c| c.with_tag(parent_tag(p))))
        .collect()
}

/// Number of parents for non-elite child slot `slot` out of `num_slots`.
///
/// Ramps linearly from `min` for the first slot towards `max` for the last.
pub fn parent_count(slot: usize, num_slots: usize, bounds: (usize, usize)) -> usize {
    let (min, max) = bounds;
    if num_slots == 0 {
        return min;
    }
    let progress = slot as f64 / num_slots as f64;
    let count = (min as f64 * (1.0 - progress) + (max + 1) as f64 * progress) as usize;
    count.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TAG_UNTAGGED;

    fn grid(n: usize, radius: f32) -> Vec<Circle> {
        (0..n * n)
            .map(|i| {
                let x = (i % n) as f32 / n as f32 + 0.5 / n as f32;
                let y = (i / n) as f32 / n as f32 + 0.5 / n as f32;
                Circle::new(x, y, radius)
            })
            .collect()
    }

    #[test]
    fn test_voronoi_partitions_the_plane() {
        let a = grid(10, 0.01);
        let b = grid(10, 0.02);
        let anchors = [(0.25, 0.5), (0.75, 0.5)];
        let child = voronoi_inherit(&[&a, &b], &anchors);

        assert_eq!(child.len(), 100);
        for c in &child {
            if c.x < 0.5 {
                assert_eq!(c.radius, 0.01);
                assert_eq!(c.tag, parent_tag(0));
            } else {
                assert_eq!(c.radius, 0.02);
                assert_eq!(c.tag, parent_tag(1));
            }
        }
    }

    #[test]
    fn test_voronoi_ties_inherit_from_both() {
        let a = [Circle::new(0.5, 0.5, 0.1)];
        let b = [Circle::new(0.5, 0.5, 0.2)];
        let child = voronoi_inherit(&[&a, &b], &[(0.25, 0.5), (0.75, 0.5)]);
        assert_eq!(child.len(), 2);
    }

    #[test]
    fn test_parent_count_ramp() {
        let counts: Vec<usize> = (0..47).map(|k| parent_count(k, 47, (2, 4))).collect();
        assert_eq!(counts[0], 2);
        assert_eq!(*counts.last().unwrap(), 4);
        assert!(counts.windows(2).all(|w| w[0] <= w[1]));
        assert!(counts.contains(&3));
        assert_eq!(parent_count(0, 0, (3, 5)), 3);
    }

    #[test]
    fn test_make_child_tops_up_small_parents() {
        let a = grid(2, 0.03);
        let b = grid(2, 0.04);
        let mut rng = CircleRng::new(8);
        let config = GeneticAlgorithmConfig {
            crossover: CrossoverMethod::RandomSubset,
            circles_mutated: 2,
            circles_randomized: 1,
            ..Default::default()
        };
        let child = rng.make_child(&[&a, &b], 20, (0.02, 0.05), &config);

        assert_eq!(child.len(), 20);
        assert_eq!(child.iter().filter(|c| c.tag != TAG_UNTAGGED).count(), 8);
        assert!(child[8..].iter().all(|c| c.tag == TAG_UNTAGGED));
    }

    #[test]
    fn test_jitter_is_bounded() {
        let mut rng = CircleRng::new(4);
        let base = Circle::new(0.5, 0.5, 0.05);
        for kernel in [MutationKernel::Uniform, MutationKernel::Gaussian] {
            for _ in 0..500 {
                let c = rng.jitter(base, 0.01, kernel);
                assert!((c.x - base.x).abs() <= 0.01 + 1e-6);
                assert!((c.y - base.y).abs() <= 0.01 + 1e-6);
                assert!((c.radius - base.radius).abs() <= 0.01 + 1e-6);
            }
        }
        assert_eq!(rng.jitter(base, 0.0, MutationKernel::Uniform), base);
    }

    #[test]
    fn test_make_child_has_exact_count() {
        let a = grid(8, 0.03);
        let b = grid(8, 0.04);
        let mut rng = CircleRng::new(21);

        for crossover in [CrossoverMethod::Voronoi, CrossoverMethod::RandomSubset] {
            let config = GeneticAlgorithmConfig {
                crossover,
                circles_mutated: 10,
                circles_randomized: 5,
                ..Default::default()
            };
            for _ in 0..10 {
                let child = rng.make_child(&[&a, &b], 64, (0.01, 0.1), &config);
                assert_eq!(child.len(), 64);
                let fresh: Vec<&Circle> = child.iter().filter(|c| c.tag == TAG_UNTAGGED).collect();
                assert!(fresh.len() >= 5, "{:?}: only {} fresh circles", crossover, fresh.len());
                assert!(fresh.iter().all(|c| (0.01..=0.1).contains(&c.radius)));
            }
        }
    }
}
