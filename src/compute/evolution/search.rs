//! Generational search: selection, replacement and the evolution loop.

use std::cmp::Ordering;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::compute::ForwardModel;
use crate::error::OptimizerError;
use crate::schema::{ExperimentalDataset, OptimizerConfig};

use super::fitness::FitnessEvaluator;
use super::genome::{Genome, GenomeRng, initialize_population, sort_by_fitness};
use super::operators::Variation;
use super::report::GenerationStats;

/// Stochastic binary tournament selection.
///
/// Each pick draws two genomes independently and uniformly (possibly the same
/// one twice) and keeps the better with probability `rate`, otherwise the
/// worse. Returns clones in selection order.
pub fn stochastic_tournament(
    population: &[Genome],
    count: usize,
    rate: f64,
    rng: &mut GenomeRng,
) -> Vec<Genome> {
    if population.is_empty() {
        return Vec::new();
    }

    (0..count)
        .map(|_| {
            let first = rng.index(population.len());
            let second = rng.index(population.len());

            let (better, worse) =
                if population[first].cmp_fitness(&population[second]) != Ordering::Less {
                    (first, second)
                } else {
                    (second, first)
                };

            let winner = if rng.flip(rate) { better } else { worse };
            population[winner].clone()
        })
        .collect()
}

/// Elitist "plus" replacement: the best `size` of parents and offspring survive.
///
/// Ties keep parents ahead of offspring.
pub fn plus_replacement(parents: Vec<Genome>, offspring: Vec<Genome>, size: usize) -> Vec<Genome> {
    let mut pool = parents;
    pool.extend(offspring);
    sort_by_fitness(&mut pool);
    pool.truncate(size);
    pool
}

/// Final result of an evolution run.
#[derive(Debug, Clone)]
pub struct EvolutionResult {
    /// Best genome of the final population.
    pub best: Genome,
    /// Final population, best first.
    pub population: Vec<Genome>,
    /// Statistics from generation 0 through the last generation.
    pub history: Vec<GenerationStats>,
    /// Run totals.
    pub stats: EvolutionStats,
}

/// Totals from an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Completed generations.
    pub generations: usize,
    /// Fitness evaluations performed.
    pub total_evaluations: u64,
    /// Best fitness achieved.
    pub best_fitness: f64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
}

/// Evolution engine that runs the generational loop.
pub struct EvolutionEngine<'a, M> {
    config: OptimizerConfig,
    rng: GenomeRng,
    evaluator: FitnessEvaluator<'a, M>,
    variation: Variation,
    population: Vec<Genome>,
    history: Vec<GenerationStats>,
    generation: usize,
}

impl<'a, M: ForwardModel> EvolutionEngine<'a, M> {
    /// Create a new evolution engine. The configuration is validated here,
    /// before any generation runs.
    pub fn new(
        config: OptimizerConfig,
        model: M,
        dataset: &'a ExperimentalDataset,
    ) -> Result<Self, OptimizerError> {
        config.validate()?;

        let rng = GenomeRng::new(config.random_seed);
        let evaluator = FitnessEvaluator::new(model, dataset);
        let variation = Variation::from_config(&config.variation);

        Ok(Self {
            config,
            rng,
            evaluator,
            variation,
            population: Vec::new(),
            history: Vec::new(),
            generation: 0,
        })
    }

    /// Build and evaluate the initial population; records generation 0.
    pub fn initialize(&mut self) -> &GenerationStats {
        self.generation = 0;
        self.history.clear();
        self.population = initialize_population(
            self.config.population.size,
            &self.config.seed_genes,
            &mut self.rng,
            &mut self.evaluator,
        );
        sort_by_fitness(&mut self.population);
        self.record()
    }

    /// Run one generation: select, vary, evaluate, replace.
    pub fn step_generation(&mut self) -> &GenerationStats {
        let population_config = &self.config.population;

        let mut offspring = stochastic_tournament(
            &self.population,
            population_config.selection_count(),
            population_config.tournament_rate,
            &mut self.rng,
        );
        self.variation.apply(&mut offspring, &mut self.rng);
        self.evaluator.evaluate_pending(&mut offspring);

        let parents = std::mem::take(&mut self.population);
        self.population = plus_replacement(parents, offspring, population_config.size);

        self.generation += 1;
        self.record()
    }

    fn record(&mut self) -> &GenerationStats {
        let stats = GenerationStats::from_population(self.generation, &self.population);
        log::debug!("{stats}");
        self.history.push(stats);
        &self.history[self.history.len() - 1]
    }

    /// Whether the generation budget is spent.
    #[inline]
    pub fn should_stop(&self) -> bool {
        self.generation >= self.config.population.max_generations
    }

    /// Current population, best first.
    #[inline]
    pub fn population(&self) -> &[Genome] {
        &self.population
    }

    #[inline]
    pub fn best(&self) -> Option<&Genome> {
        self.population.first()
    }

    #[inline]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[inline]
    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    #[inline]
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Fitness evaluator, e.g. to re-simulate the best genome.
    #[inline]
    pub fn evaluator_mut(&mut self) -> &mut FitnessEvaluator<'a, M> {
        &mut self.evaluator
    }

    /// Run evolution, calling `callback` after initialization and after
    /// every generation.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> EvolutionResult
    where
        F: FnMut(&GenerationStats),
    {
        let start_time = Instant::now();

        callback(self.initialize());
        while !self.should_stop() {
            callback(self.step_generation());
        }

        self.result(start_time.elapsed().as_secs_f64())
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> EvolutionResult {
        self.run_with_callback(|_| {})
    }

    /// Snapshot the current state as a result.
    pub fn result(&self, elapsed_seconds: f64) -> EvolutionResult {
        // Initialization always yields at least one genome for a valid config.
        let best = self
            .population
            .first()
            .cloned()
            .unwrap_or_else(|| Genome::new(self.config.seed_genes.to_genes()));

        EvolutionResult {
            stats: EvolutionStats {
                generations: self.generation,
                total_evaluations: self.evaluator.evaluations(),
                best_fitness: best.fitness_value().unwrap_or(f64::NEG_INFINITY),
                elapsed_seconds,
            },
            best,
            population: self.population.clone(),
            history: self.history.clone(),
        }
    }
}
