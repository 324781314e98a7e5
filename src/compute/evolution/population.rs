//! Candidates, generations and fitness-proportional parent sampling.

use rand::Rng;

use crate::compute::Evaluation;
use crate::schema::{CandidateSnapshot, CandidateSummary, Circle};

/// One complete circle-list solution and its score.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Unique identifier, issued by the engine.
    pub id: u64,
    pub circles: Vec<Circle>,
    /// Higher is better.
    pub fitness: f32,
    /// Reconstruction error.
    pub error: f32,
    pub num_segments: usize,
    /// Zero for seed candidates.
    pub num_parents: usize,
    /// Generation the candidate was created in.
    pub generation: usize,
}

impl Candidate {
    /// Wrap an evaluated circle list.
    pub fn new(
        id: u64,
        circles: Vec<Circle>,
        evaluation: &Evaluation,
        num_parents: usize,
        generation: usize,
    ) -> Self {
        Self {
            id,
            circles,
            fitness: evaluation.fitness,
            error: evaluation.error,
            num_segments: evaluation.num_segments,
            num_parents,
            generation,
        }
    }

    pub fn summary(&self) -> CandidateSummary {
        CandidateSummary {
            id: self.id,
            fitness: self.fitness,
            error: self.error,
            num_segments: self.num_segments,
            num_parents: self.num_parents,
            generation: self.generation,
        }
    }

    /// Convert to snapshot for serialization.
    pub fn to_snapshot(&self) -> CandidateSnapshot {
        CandidateSnapshot {
            summary: self.summary(),
            circles: self.circles.clone(),
        }
    }
}

/// A population, sorted by descending fitness. Never mutated after creation.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    candidates: Vec<Candidate>,
}

impl Generation {
    /// Sort candidates best first and freeze them.
    ///
    /// The sort is stable, so among equal fitness earlier candidates stay first.
    pub fn new(mut candidates: Vec<Candidate>) -> Self {
        candidates.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        Self { candidates }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    pub fn avg_fitness(&self) -> f32 {
        self.mean(|c| c.fitness)
    }

    pub fn fitness_std(&self) -> f32 {
        let avg = self.avg_fitness();
        self.mean(|c| (c.fitness - avg).powi(2)).sqrt()
    }

    pub fn avg_segments(&self) -> f32 {
        self.mean(|c| c.num_segments as f32)
    }

    fn mean(&self, f: impl Fn(&Candidate) -> f32) -> f32 {
        if self.candidates.is_empty() {
            return 0.0;
        }
        self.candidates.iter().map(f).sum::<f32>() / self.candidates.len() as f32
    }

    /// Build the parent sampler for this generation.
    pub fn sampler(&self) -> ParentSampler {
        ParentSampler::new(self.candidates.iter().map(|c| c.fitness))
    }
}

/// Fitness-proportional (roulette wheel) selection over a fixed population.
#[derive(Debug, Clone)]
pub struct ParentSampler {
    cumulative: Vec<f32>,
}

impl ParentSampler {
    /// Normalize fitness values into a cumulative distribution.
    ///
    /// Falls back to uniform weights when the total is not positive.
    pub fn new(fitness: impl IntoIterator<Item = f32>) -> Self {
        let weights: Vec<f32> = fitness.into_iter().map(|f| f.max(0.0)).collect();
        let total: f32 = weights.iter().sum();
        let n = weights.len();

        let cumulative = if total > 0.0 && total.is_finite() {
            weights
                .iter()
                .scan(0.0f32, |acc, w| {
                    *acc += w / total;
                    Some(*acc)
                })
                .collect()
        } else {
            (1..=n).map(|i| i as f32 / n as f32).collect()
        };
        Self { cumulative }
    }

    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// Cumulative share up to and including each index.
    pub fn cumulative(&self) -> &[f32] {
        &self.cumulative
    }

    /// Index selected by a draw `r` in `[0, 1)`.
    ///
    /// A draw equal to a table entry selects that entry; otherwise the next
    /// higher entry is selected. Draws above the last entry (rounding) select
    /// the last index.
    pub fn index_for(&self, r: f32) -> usize {
        let idx = self.cumulative.partition_point(|&c| c < r);
        idx.min(self.cumulative.len().saturating_sub(1))
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.index_for(rng.r#gen::<f32>())
    }

    /// Draw `n` distinct indices (capped at the population size).
    ///
    /// Redraws on repeats. If that stalls, the remaining slots are filled
    /// with the best-ranked unused indices.
    pub fn sample_distinct<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<usize> {
        let n = n.min(self.len());
        let mut picked = Vec::with_capacity(n);
        let mut draws = 0;
        let max_draws = 1000 * n.max(1);

        while picked.len() < n && draws < max_draws {
            draws += 1;
            let idx = self.sample(rng);
            if !picked.contains(&idx) {
                picked.push(idx);
            }
        }
        let mut next = 0;
        while picked.len() < n {
            if !picked.contains(&next) {
                picked.push(next);
            }
            next += 1;
        }
        picked
    }
}
