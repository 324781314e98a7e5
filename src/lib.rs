//! Bubbles - Approximate grayscale images with sets of circle outlines.
//!
//! A circle list partitions the image plane into segments: pixels covered by
//! exactly the same circles form one segment, and uncovered pixels form
//! connected background patches. Each segment is painted with its mean source
//! intensity, quantized to a few grey levels. Lists are scored by how closely
//! that reconstruction matches the source and how few segments it needs, and
//! improved by a genetic search.
//!
//! # Architecture
//!
//! - `schema`: Circles, source images and configuration types
//! - `compute`: Geometry, edge ratings, circle generation and pruning,
//!   coverage and segment aggregation, fitness and the genetic search
//! - `io`: Raster, circle list, seed folder and SVG files
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use bubbles::{Circle, EvaluationConfig, FitnessEvaluator, io};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let image = Arc::new(io::load_grayscale(Path::new("input.png"))?);
//! let evaluator = FitnessEvaluator::new(image, EvaluationConfig::default())?;
//!
//! let circles = vec![Circle::new(0.5, 0.5, 0.25), Circle::new(0.3, 0.4, 0.1)];
//! let evaluation = evaluator.evaluate(&circles);
//! println!(
//!     "error {:.3} over {} segments, fitness {:.4}",
//!     evaluation.error, evaluation.num_segments, evaluation.fitness
//! );
//! # Ok(())
//! # }
//! ```

pub mod compute;
pub mod io;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{EvolutionEngine, EvolutionError};
pub use compute::{Evaluation, FitnessEvaluator, SegmentMap};
pub use schema::{Circle, EvaluationConfig, EvolutionConfig, RunConfig, SourceImage};
