//! Scoring a circle list against a source image.
//!
//! The circle list is turned into segments, every segment is painted with its
//! quantized mean color, and the reconstruction is compared with the
//! quantized source. The raw score adds a penalty per segment; fitness is its
//! reciprocal, so higher fitness is better.

use std::sync::Arc;
use std::time::Instant;

use log::debug;
use rayon::prelude::*;

use crate::schema::{Circle, ConfigError, EvaluationConfig, SourceImage};

use super::{CoverageIndex, SegmentMap, quantize};

/// Raw score of an evaluation: lower is better.
#[inline]
pub fn raw_score(error: f32, num_segments: usize, segment_penalty_divisor: f32) -> f32 {
    error + num_segments as f32 / segment_penalty_divisor
}

/// Result of evaluating one circle list.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Reconstructed image, row-major.
    pub pixels: Vec<u8>,
    /// Mean absolute difference between quantized source and reconstruction.
    pub error: f32,
    pub num_segments: usize,
    /// `error + num_segments / divisor`.
    pub score: f32,
    /// `1 / score`.
    pub fitness: f32,
    pub segments: SegmentMap,
}

/// Evaluates circle lists against one source image.
///
/// Cheap to clone; the image is shared.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    image: Arc<SourceImage>,
    quantized: Arc<Vec<u8>>,
    config: EvaluationConfig,
}

impl FitnessEvaluator {
    /// Create an evaluator for an image.
    pub fn new(image: Arc<SourceImage>, config: EvaluationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let step = config.grey_step();
        let quantized = image.pixels.par_iter().map(|&p| quantize(p as f32, step)).collect();
        Ok(Self {
            image,
            quantized: Arc::new(quantized),
            config,
        })
    }

    pub fn image(&self) -> &SourceImage {
        &self.image
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Source pixels quantized to the grey step.
    pub fn quantized_source(&self) -> &[u8] {
        &self.quantized
    }

    /// Build the coverage index, aggregate segments, reconstruct and score.
    pub fn evaluate(&self, circles: &[Circle]) -> Evaluation {
        let start = Instant::now();
        let width = self.image.width;
        let step = self.config.grey_step();

        let index = CoverageIndex::build(circles, width, self.image.height);
        let segments = SegmentMap::build(&index, &self.image, step);
        let pixels = segments.reconstruct();

        let total: u64 = pixels
            .par_chunks(width)
            .zip(self.quantized.par_chunks(width))
            .map(|(row, source)| {
                row.iter()
                    .zip(source)
                    .map(|(&a, &b)| a.abs_diff(b) as u64)
                    .sum::<u64>()
            })
            .sum();
        let error = (total as f64 / pixels.len() as f64).clamp(0.0, 255.0) as f32;

        let num_segments = segments.len();
        let score = raw_score(error, num_segments, self.config.segment_penalty_divisor);

        debug!(
            "Evaluated {} circles: {} segments, error {:.3} ({:.1}ms)",
            circles.len(),
            num_segments,
            error,
            start.elapsed().as_secs_f64() * 1000.0
        );

        Evaluation {
            pixels,
            error,
            num_segments,
            score,
            fitness: 1.0 / score,
            segments,
        }
    }

    /// Evaluate several circle lists, in order.
    ///
    /// Lists are scored in parallel, at most `max_concurrent` at a time, since
    /// every evaluation holds its own coverage arena.
    pub fn evaluate_batch(&self, lists: &[Vec<Circle>], max_concurrent: usize) -> Vec<Evaluation> {
        let mut evaluations = Vec::with_capacity(lists.len());
        for chunk in lists.chunks(max_concurrent.max(1)) {
            evaluations.par_extend(chunk.par_iter().map(|circles| self.evaluate(circles)));
        }
        evaluations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn evaluator(image: SourceImage) -> FitnessEvaluator {
        FitnessEvaluator::new(Arc::new(image), EvaluationConfig::default()).unwrap()
    }

    #[test]
    fn test_two_halves_reconstruct_exactly() {
        let evaluator = evaluator(SourceImage::uniform(4, 4, 102).unwrap());
        let circles = [Circle::new(-10.0, 0.5, 10.5), Circle::new(11.0, 0.5, 10.5)];
        let result = evaluator.evaluate(&circles);

        assert_eq!(result.num_segments, 2);
        assert_eq!(result.error, 0.0);
        assert!(result.pixels.iter().all(|&p| p == 102));
        assert!((result.score - 2.0 / 500.0).abs() < 1e-6);
        assert!((result.fitness - 250.0).abs() < 1e-2);
    }

    #[test]
    fn test_error_against_quantized_source() {
        // A 0/255 checkerboard with no circles: one patch averaging 127.5.
        let pixels: Vec<u8> = (0..16).map(|i| if (i + i / 4) % 2 == 0 { 0 } else { 255 }).collect();
        let evaluator = evaluator(SourceImage::new(4, 4, pixels).unwrap());
        let result = evaluator.evaluate(&[]);

        assert_eq!(result.num_segments, 1);
        let color = result.pixels[0];
        assert!(color == 102 || color == 153, "color {}", color);
        let expected = (color as f32 + (255.0 - color as f32)) / 2.0;
        assert!((result.error - expected).abs() < 1e-4);
    }

    #[test]
    fn test_evaluate_batch_matches_single_evaluations() {
        let pixels: Vec<u8> = (0..20 * 20).map(|i| (i * 13 % 256) as u8).collect();
        let evaluator = evaluator(SourceImage::new(20, 20, pixels).unwrap());
        let mut rng = StdRng::seed_from_u64(3);
        let lists: Vec<Vec<Circle>> = (0..7)
            .map(|n| (0..n * 3).map(|_| Circle::random(&mut rng, 0.05, 0.3)).collect())
            .collect();

        for limit in [0, 1, 3, 16] {
            let batch = evaluator.evaluate_batch(&lists, limit);
            assert_eq!(batch.len(), lists.len());
            for (circles, result) in lists.iter().zip(&batch) {
                let single = evaluator.evaluate(circles);
                assert_eq!(result.num_segments, single.num_segments);
                assert_eq!(result.error, single.error);
                assert_eq!(result.fitness, single.fitness);
            }
        }
        assert!(evaluator.evaluate_batch(&[], 4).is_empty());
    }

    #[test]
    fn test_quantized_source() {
        let evaluator = evaluator(SourceImage::new(2, 1, vec![30, 240]).unwrap());
        assert_eq!(evaluator.quantized_source(), &[51, 255]);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = EvaluationConfig {
            grey_levels: 0,
            ..Default::default()
        };
        let image = Arc::new(SourceImage::uniform(2, 2, 0).unwrap());
        assert!(FitnessEvaluator::new(image, config).is_err());
    }

    #[test]
    fn test_fitness_always_positive_and_finite() {
        let pixels: Vec<u8> = (0..32 * 24).map(|i| (i * 37 % 256) as u8).collect();
        let evaluator = evaluator(SourceImage::new(32, 24, pixels).unwrap());
        let mut rng = StdRng::seed_from_u64(17);

        for n in [0, 1, 10, 80] {
            let circles: Vec<Circle> = (0..n).map(|_| Circle::random(&mut rng, 0.01, 0.2)).collect();
            let result = evaluator.evaluate(&circles);
            assert!(result.num_segments >= 1);
            assert!(result.error >= 0.0 && result.error <= 255.0);
            assert!(result.fitness.is_finite() && result.fitness > 0.0, "n = {}", n);
        }
    }
}
