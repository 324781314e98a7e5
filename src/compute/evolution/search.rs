//! The generation loop.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};

use crate::compute::FitnessEvaluator;
use crate::io::load_seed_folder;
use crate::schema::{
    Circle, EvolutionConfig, EvolutionConfigError, EvolutionHistory, EvolutionPhase,
    EvolutionProgress, EvolutionResult, EvolutionStats, SourceImage, StopReason,
};

use super::EvolutionError;
use super::genome::{CircleRng, parent_count};
use super::population::{Candidate, Generation};

/// Evolution engine that runs the search.
///
/// Lifecycle: [`EvolutionPhase::Uninitialized`] until seeds are loaded,
/// [`EvolutionPhase::FirstGenerationLoaded`] after, then
/// [`EvolutionPhase::GenerationProduced`] per [`Self::step`] and
/// [`EvolutionPhase::Terminated`] once a run finishes.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    rng: CircleRng,
    evaluator: FitnessEvaluator,
    current: Generation,
    phase: EvolutionPhase,
    history: EvolutionHistory,
    generation: usize,
    best_fitness: f32,
    stagnation_count: usize,
    next_id: u64,
    total_evaluations: u64,
}

impl EvolutionEngine {
    /// Create a new evolution engine for an image.
    pub fn new(config: EvolutionConfig, image: Arc<SourceImage>) -> Result<Self, EvolutionError> {
        config.validate()?;
        let rng = match config.random_seed {
            Some(seed) => CircleRng::new(seed),
            None => CircleRng::random(),
        };
        let evaluator = FitnessEvaluator::new(image, config.evaluation.clone())
            .map_err(EvolutionConfigError::from)?;

        Ok(Self {
            config,
            rng,
            evaluator,
            current: Generation::default(),
            phase: EvolutionPhase::Uninitialized,
            history: EvolutionHistory::default(),
            generation: 0,
            best_fitness: f32::NEG_INFINITY,
            stagnation_count: 0,
            next_id: 0,
            total_evaluations: 0,
        })
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &FitnessEvaluator {
        &self.evaluator
    }

    pub fn phase(&self) -> &EvolutionPhase {
        &self.phase
    }

    /// The current generation, best first.
    pub fn current(&self) -> &Generation {
        &self.current
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.current.best()
    }

    pub fn history(&self) -> &EvolutionHistory {
        &self.history
    }

    fn issue_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Score seed circle lists and make them the first generation.
    ///
    /// The first `population.size` seeds are used. Fails before scoring
    /// anything if there are too few seeds or any used seed has the wrong
    /// circle count.
    pub fn load_first_generation(&mut self, seeds: Vec<Vec<Circle>>) -> Result<(), EvolutionError> {
        let required = self.config.population.size;
        let expected = self.config.circles_per_candidate;
        if seeds.len() < required {
            return Err(EvolutionError::TooFewSeeds {
                found: seeds.len(),
                required,
            });
        }
        if let Some((index, seed)) = seeds
            .iter()
            .take(required)
            .enumerate()
            .find(|(_, s)| s.len() != expected)
        {
            return Err(EvolutionError::CircleCountMismatch {
                index,
                found: seed.len(),
                expected,
            });
        }

        let mut seeds = seeds;
        seeds.truncate(required);
        let evaluations = self
            .evaluator
            .evaluate_batch(&seeds, self.config.concurrent_evaluations());

        self.next_id = 0;
        let candidates = seeds
            .into_iter()
            .zip(evaluations)
            .map(|(circles, evaluation)| {
                let id = self.issue_id();
                Candidate::new(id, circles, &evaluation, 0, 0)
            })
            .collect();

        self.current = Generation::new(candidates);
        self.generation = 0;
        self.stagnation_count = 0;
        self.best_fitness = self.current.best().map_or(f32::NEG_INFINITY, |c| c.fitness);
        self.total_evaluations = required as u64;
        self.history = EvolutionHistory::default();
        self.record_history();
        self.phase = EvolutionPhase::FirstGenerationLoaded;

        info!(
            "Loaded {} seed candidates, best fitness {:.4}",
            required, self.best_fitness
        );
        Ok(())
    }

    /// Load the first generation from a folder of circle list files.
    pub fn load_seed_folder(&mut self, dir: &Path) -> Result<(), EvolutionError> {
        let seeds = load_seed_folder(dir)?;
        self.load_first_generation(seeds)
    }

    /// Produce the next generation from the current one.
    pub fn step(&mut self) -> Result<(), EvolutionError> {
        if self.phase == EvolutionPhase::Uninitialized {
            return Err(EvolutionError::NotLoaded);
        }
        let start = Instant::now();
        let ga = &self.config.genetic;
        let size = self.config.population.size;
        let per_candidate = self.config.circles_per_candidate;
        let next_generation = self.generation + 1;

        self.log_elites();

        let elites: Vec<Candidate> = self
            .current
            .candidates()
            .iter()
            .take(ga.elitism)
            .cloned()
            .collect();

        // Variation is sequential so a seeded run is reproducible.
        let sampler = self.current.sampler();
        let num_children = size - elites.len();
        let children: Vec<(Vec<Circle>, usize)> = (0..num_children)
            .map(|slot| {
                let n = parent_count(slot, num_children, ga.parent_bounds);
                let parents: Vec<&[Circle]> = sampler
                    .sample_distinct(self.rng.rng_mut(), n)
                    .into_iter()
                    .map(|i| self.current.candidates()[i].circles.as_slice())
                    .collect();
                let circles =
                    self.rng.make_child(&parents, per_candidate, self.config.radius_bounds, ga);
                (circles, parents.len())
            })
            .collect();

        let (lists, parent_counts): (Vec<Vec<Circle>>, Vec<usize>) = children.into_iter().unzip();
        let evaluations = self
            .evaluator
            .evaluate_batch(&lists, self.config.concurrent_evaluations());

        let mut candidates = elites;
        let scored = lists.into_iter().zip(evaluations).zip(parent_counts);
        for ((circles, evaluation), num_parents) in scored {
            let id = self.issue_id();
            candidates.push(Candidate::new(
                id,
                circles,
                &evaluation,
                num_parents,
                next_generation,
            ));
        }

        self.current = Generation::new(candidates);
        self.generation = next_generation;
        self.total_evaluations += num_children as u64;

        let generation_best = self.current.best().map_or(f32::NEG_INFINITY, |c| c.fitness);
        if generation_best > self.best_fitness {
            self.best_fitness = generation_best;
            self.stagnation_count = 0;
        } else {
            self.stagnation_count += 1;
        }
        self.record_history();
        self.phase = EvolutionPhase::GenerationProduced;

        info!(
            "Generation {}: best {:.4}, avg {:.4}, {} children in {:.2}s",
            self.generation,
            generation_best,
            self.current.avg_fitness(),
            num_children,
            start.elapsed().as_secs_f32()
        );
        Ok(())
    }

    fn log_elites(&self) {
        for (rank, elite) in self
            .current
            .candidates()
            .iter()
            .take(self.config.genetic.elitism)
            .enumerate()
        {
            if elite.num_parents == 0 {
                info!(
                    "Elite {}: id {}, fitness {:.4}, segments {}",
                    rank, elite.id, elite.fitness, elite.num_segments
                );
            } else {
                info!(
                    "Elite {}: id {}, fitness {:.4}, parents {}, segments {}, generation {}",
                    rank,
                    elite.id,
                    elite.fitness,
                    elite.num_parents,
                    elite.num_segments,
                    elite.generation
                );
            }
        }
    }

    fn record_history(&mut self) {
        let generation = &self.current;
        self.history
            .best_fitness
            .push(generation.best().map_or(0.0, |c| c.fitness));
        self.history.avg_fitness.push(generation.avg_fitness());
        self.history.fitness_std.push(generation.fitness_std());
        self.history.avg_segments.push(generation.avg_segments());
    }

    /// Get current progress.
    pub fn progress(&self) -> EvolutionProgress {
        EvolutionProgress {
            generation: self.generation,
            total_generations: self.config.population.max_generations,
            best_fitness: self.best_fitness,
            avg_fitness: self.current.avg_fitness(),
            stagnation_count: self.stagnation_count,
            elites: self
                .current
                .candidates()
                .iter()
                .take(self.config.genetic.elitism.max(1))
                .map(Candidate::summary)
                .collect(),
            phase: self.phase.clone(),
        }
    }

    /// Check if evolution should stop.
    fn should_stop(&self) -> Option<StopReason> {
        if self.generation >= self.config.population.max_generations {
            return Some(StopReason::MaxGenerations);
        }

        if let Some(target) = self.config.population.target_fitness
            && self.best_fitness > target
        {
            return Some(StopReason::TargetReached);
        }

        if let Some(limit) = self.config.population.stagnation_limit
            && self.stagnation_count >= limit
        {
            return Some(StopReason::Stagnation);
        }

        None
    }

    /// Run evolution with progress callback.
    ///
    /// The first generation must already be loaded. The callback sees the
    /// loaded generation and then every produced one.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> Result<EvolutionResult, EvolutionError>
    where
        F: FnMut(&EvolutionProgress),
    {
        if self.phase == EvolutionPhase::Uninitialized {
            return Err(EvolutionError::NotLoaded);
        }
        let start_time = Instant::now();
        callback(&self.progress());

        let stop_reason = loop {
            if let Some(reason) = self.should_stop() {
                break reason;
            }
            self.step()?;
            callback(&self.progress());
        };
        self.phase = EvolutionPhase::Terminated;

        let best = self.current.best().ok_or(EvolutionError::NotLoaded)?;
        debug!("Stopped after {} generations: {:?}", self.generation, stop_reason);

        Ok(EvolutionResult {
            best: best.to_snapshot(),
            stats: EvolutionStats {
                generations: self.generation,
                total_evaluations: self.total_evaluations,
                best_fitness: self.best_fitness,
                final_avg_fitness: self.current.avg_fitness(),
                elapsed_seconds: start_time.elapsed().as_secs_f64(),
                stop_reason,
            },
            history: self.history.clone(),
        })
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> Result<EvolutionResult, EvolutionError> {
        self.run_with_callback(|_| {})
    }
}
