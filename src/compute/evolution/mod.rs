//! Genetic search over circle lists.
//!
//! # Overview
//!
//! - **Variation** (`genome`): Voronoi and random-subset crossover, circle
//!   jitter, top-up with fresh circles
//! - **Population** (`population`): candidates, immutable generations and
//!   fitness-proportional parent sampling
//! - **Search** (`search`): the generation loop with elitism
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use bubbles::compute::evolution::EvolutionEngine;
//! use bubbles::io::load_grayscale;
//! use bubbles::schema::EvolutionConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let image = Arc::new(load_grayscale(Path::new("input.png"))?);
//! let mut engine = EvolutionEngine::new(EvolutionConfig::default(), image)?;
//! engine.load_seed_folder(Path::new("seeds"))?;
//!
//! let result = engine.run_with_callback(|progress| {
//!     println!("Generation {}: best fitness = {:.4}",
//!         progress.generation, progress.best_fitness);
//! })?;
//! println!("Best error: {}", result.best.summary.error);
//! # Ok(())
//! # }
//! ```

mod genome;
mod population;
mod search;

pub use genome::*;
pub use population::*;
pub use search::*;

use crate::io::IoError;
use crate::schema::EvolutionConfigError;

/// Errors that abort an evolution run.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    #[error("Too few seed files: found {found}, require at least {required}")]
    TooFewSeeds { found: usize, required: usize },
    #[error("Seed {index} has {found} circles instead of the expected {expected}")]
    CircleCountMismatch {
        index: usize,
        found: usize,
        expected: usize,
    },
    #[error("No generation loaded")]
    NotLoaded,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] EvolutionConfigError),
    #[error(transparent)]
    Io(#[from] IoError),
}
