//! Evolution configuration types for circle-set optimization.
//!
//! This module provides the types that configure the genetic algorithm which
//! evolves populations of circle lists towards a low reconstruction error.

use serde::{Deserialize, Serialize};

use super::{Circle, ConfigError, EvaluationConfig, SeedingConfig};

/// Top-level configuration for the evolutionary search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// How candidates are scored.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Crossover and mutation settings.
    #[serde(default)]
    pub genetic: GeneticAlgorithmConfig,
    /// Exact number of circles every candidate carries.
    #[serde(default = "default_circles_per_candidate")]
    pub circles_per_candidate: usize,
    /// Radius bounds (min, max) for freshly generated circles.
    #[serde(default = "default_radius_bounds")]
    pub radius_bounds: (f32, f32),
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Upper bound on candidates scored at once (defaults to the thread count).
    #[serde(default)]
    pub max_concurrent_evaluations: Option<usize>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            evaluation: EvaluationConfig::default(),
            population: PopulationConfig::default(),
            genetic: GeneticAlgorithmConfig::default(),
            circles_per_candidate: default_circles_per_candidate(),
            radius_bounds: default_radius_bounds(),
            random_seed: None,
            max_concurrent_evaluations: None,
        }
    }
}

fn default_circles_per_candidate() -> usize {
    600
}
fn default_radius_bounds() -> (f32, f32) {
    (0.01, 0.1)
}

/// Population size and stopping criteria.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of candidates per generation.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Maximum number of generations.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
    /// Stop once the best fitness exceeds this.
    #[serde(default = "default_target_fitness")]
    pub target_fitness: Option<f32>,
    /// Stagnation limit: stop if no improvement for N generations.
    #[serde(default)]
    pub stagnation_limit: Option<usize>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            max_generations: default_max_generations(),
            target_fitness: default_target_fitness(),
            stagnation_limit: None,
        }
    }
}

fn default_population_size() -> usize {
    50
}
fn default_max_generations() -> usize {
    10
}
fn default_target_fitness() -> Option<f32> {
    Some(0.2)
}

/// Genetic algorithm operator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticAlgorithmConfig {
    /// Crossover operator.
    #[serde(default)]
    pub crossover: CrossoverMethod,
    /// Number of best candidates copied unchanged into the next generation.
    #[serde(default = "default_elitism")]
    pub elitism: usize,
    /// Parent count range (min, max), inclusive.
    #[serde(default = "default_parent_bounds")]
    pub parent_bounds: (usize, usize),
    /// Number of inherited circles that receive jitter.
    #[serde(default = "default_circles_mutated")]
    pub circles_mutated: usize,
    /// Largest jitter applied to x, y or radius.
    #[serde(default = "default_max_mutation")]
    pub max_mutation: f32,
    /// Distribution of the jitter.
    #[serde(default)]
    pub mutation_kernel: MutationKernel,
    /// Minimum number of fresh random circles in every child.
    #[serde(default = "default_circles_randomized")]
    pub circles_randomized: usize,
}

impl Default for GeneticAlgorithmConfig {
    fn default() -> Self {
        Self {
            crossover: CrossoverMethod::default(),
            elitism: default_elitism(),
            parent_bounds: default_parent_bounds(),
            circles_mutated: default_circles_mutated(),
            max_mutation: default_max_mutation(),
            mutation_kernel: MutationKernel::default(),
            circles_randomized: default_circles_randomized(),
        }
    }
}

fn default_elitism() -> usize {
    3
}
fn default_parent_bounds() -> (usize, usize) {
    (2, 4)
}
fn default_circles_mutated() -> usize {
    100
}
fn default_max_mutation() -> f32 {
    0.01
}
fn default_circles_randomized() -> usize {
    10
}

/// How parents' circles are recombined into a child.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CrossoverMethod {
    /// Each parent owns the Voronoi cell around a random anchor point and
    /// contributes only the circles centered in its cell.
    #[default]
    Voronoi,
    /// Circles are drawn uniformly from the pooled parents.
    RandomSubset,
}

/// Distribution used for circle jitter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MutationKernel {
    /// Uniform in `[-max_mutation, max_mutation]`.
    #[default]
    Uniform,
    /// Normal with deviation `max_mutation / 2`, clamped to `±max_mutation`.
    Gaussian,
}

/// Everything the command-line tool reads from one JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub evolution: EvolutionConfig,
    #[serde(default)]
    pub seeding: SeedingConfig,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        self.evolution.validate()?;
        self.seeding.validate()?;
        Ok(())
    }
}

// ============================================================================
// Progress and Results
// ============================================================================

/// Current state of the evolution engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EvolutionPhase {
    /// No generation loaded yet.
    #[default]
    Uninitialized,
    /// Seed candidates scored and sorted.
    FirstGenerationLoaded,
    /// At least one generation produced.
    GenerationProduced,
    /// Loop finished.
    Terminated,
}

/// Progress report passed to callbacks once per generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Current generation number.
    pub generation: usize,
    /// Generation cap.
    pub total_generations: usize,
    /// Best fitness seen so far.
    pub best_fitness: f32,
    /// Average fitness of current population.
    pub avg_fitness: f32,
    /// Generations since last improvement.
    pub stagnation_count: usize,
    /// Top candidates, best first.
    pub elites: Vec<CandidateSummary>,
    /// Current phase.
    pub phase: EvolutionPhase,
}

/// Compact description of a candidate for progress output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: u64,
    pub fitness: f32,
    pub error: f32,
    pub num_segments: usize,
    pub num_parents: usize,
    pub generation: usize,
}

/// Snapshot of a candidate for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSnapshot {
    pub summary: CandidateSummary,
    pub circles: Vec<Circle>,
}

/// Evolution history for plotting.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvolutionHistory {
    /// Best fitness per generation.
    pub best_fitness: Vec<f32>,
    /// Average fitness per generation.
    pub avg_fitness: Vec<f32>,
    /// Standard deviation per generation.
    pub fitness_std: Vec<f32>,
    /// Average segment count per generation.
    pub avg_segments: Vec<f32>,
}

/// Final result of an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Best candidate found.
    pub best: CandidateSnapshot,
    /// Run statistics.
    pub stats: EvolutionStats,
    /// Per-generation history.
    pub history: EvolutionHistory,
}

/// Statistics about an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Generations produced after the first.
    pub generations: usize,
    /// Total candidate evaluations.
    pub total_evaluations: u64,
    /// Best fitness achieved.
    pub best_fitness: f32,
    /// Average fitness of final population.
    pub final_avg_fitness: f32,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason evolution stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached maximum generations.
    MaxGenerations,
    /// Best fitness exceeded the target.
    TargetReached,
    /// Stagnation limit hit.
    Stagnation,
}

// ============================================================================
// Validation
// ============================================================================

/// Evolution configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionConfigError {
    #[error("Population size must be at least 2")]
    PopulationTooSmall,
    #[error("Elitism {elitism} must be smaller than the population size {size}")]
    TooManyElites { elitism: usize, size: usize },
    #[error("Invalid parent bounds: {0}")]
    InvalidParentBounds(String),
    #[error("Circles per candidate must be positive")]
    NoCircles,
    #[error("Cannot mutate {mutated} circles of a {total}-circle candidate")]
    TooManyMutated { mutated: usize, total: usize },
    #[error("Base config validation failed: {0}")]
    BaseConfigError(#[from] ConfigError),
}

impl EvolutionConfig {
    /// Number of candidates scored in parallel, never zero.
    pub fn concurrent_evaluations(&self) -> usize {
        self.max_concurrent_evaluations
            .unwrap_or_else(rayon::current_num_threads)
            .max(1)
    }

    /// Validate evolution configuration.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        self.evaluation.validate()?;

        if self.radius_bounds.0 < 0.0 || self.radius_bounds.0 > self.radius_bounds.1 {
            return Err(ConfigError::InvalidRadiusBounds {
                min: self.radius_bounds.0,
                max: self.radius_bounds.1,
            }
            .into());
        }

        let size = self.population.size;
        if size < 2 {
            return Err(EvolutionConfigError::PopulationTooSmall);
        }
        if self.genetic.elitism >= size {
            return Err(EvolutionConfigError::TooManyElites {
                elitism: self.genetic.elitism,
                size,
            });
        }

        let (min_parents, max_parents) = self.genetic.parent_bounds;
        if min_parents < 2 || max_parents < min_parents {
            return Err(EvolutionConfigError::InvalidParentBounds(format!(
                "({min_parents}, {max_parents}) needs 2 <= min <= max"
            )));
        }
        if max_parents > size {
            return Err(EvolutionConfigError::InvalidParentBounds(format!(
                "max {max_parents} exceeds population size {size}"
            )));
        }

        if self.circles_per_candidate == 0 {
            return Err(EvolutionConfigError::NoCircles);
        }
        if self.genetic.circles_mutated > self.circles_per_candidate
            || self.genetic.circles_randomized > self.circles_per_candidate
        {
            return Err(EvolutionConfigError::TooManyMutated {
                mutated: self
                    .genetic
                    .circles_mutated
                    .max(self.genetic.circles_randomized),
                total: self.circles_per_candidate,
            });
        }

        Ok(())
    }
}
