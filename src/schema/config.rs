//! Configuration types for the kinetic parameter search.

use serde::{Deserialize, Serialize};

/// Number of genes in a kinetic genome.
pub const GENE_COUNT: usize = 4;

/// Arrhenius decomposition parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KineticParams {
    /// Pre-exponential factor (1/s).
    pub a: f64,
    /// Activation energy (J/mol).
    pub e: f64,
    /// Reaction order.
    pub ns: f64,
    /// Asymptotic (residual) mass fraction.
    pub yinf: f64,
}

impl Default for KineticParams {
    fn default() -> Self {
        Self {
            a: 5.49e12,
            e: 1.70e5,
            ns: 3.56,
            yinf: 0.231642,
        }
    }
}

impl KineticParams {
    /// Gene order used by genomes: `[A, E, NS, yinf]`.
    #[inline]
    pub fn to_genes(&self) -> [f64; GENE_COUNT] {
        [self.a, self.e, self.ns, self.yinf]
    }

    #[inline]
    pub fn from_genes(genes: &[f64; GENE_COUNT]) -> Self {
        Self {
            a: genes[0],
            e: genes[1],
            ns: genes[2],
            yinf: genes[3],
        }
    }
}

/// Top-level optimizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Random seed for reproducibility.
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Crossover and mutation settings.
    #[serde(default)]
    pub variation: VariationConfig,
    /// Literal starting guesses perturbed by the initializer.
    #[serde(default)]
    pub seed_genes: KineticParams,
    /// Output artifacts and console reporting.
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            random_seed: default_random_seed(),
            population: PopulationConfig::default(),
            variation: VariationConfig::default(),
            seed_genes: KineticParams::default(),
            output: OutputConfig::default(),
        }
    }
}

fn default_random_seed() -> u64 {
    1337
}

/// Population and generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of genomes kept between generations.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Number of generations to run before stopping.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
    /// Parents selected per generation, as a multiple of the population size.
    #[serde(default = "default_selection_rate")]
    pub selection_rate: f64,
    /// Probability that a binary tournament keeps the better contender.
    #[serde(default = "default_tournament_rate")]
    pub tournament_rate: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            max_generations: default_max_generations(),
            selection_rate: default_selection_rate(),
            tournament_rate: default_tournament_rate(),
        }
    }
}

/// Largest accepted ratio of selected parents to population size.
pub const MAX_SELECTION_RATE: f64 = 100.0;

impl PopulationConfig {
    /// Number of parents drawn by selection each generation.
    pub fn selection_count(&self) -> usize {
        (self.selection_rate * self.size as f64).floor() as usize
    }
}

fn default_population_size() -> usize {
    100
}
fn default_max_generations() -> usize {
    1000
}
fn default_selection_rate() -> f64 {
    2.0
}
fn default_tournament_rate() -> f64 {
    0.8
}

/// How a combined operator decides which of its sub-operators run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DispatchPolicy {
    /// Roulette draw over normalized weights; exactly one sub-operator runs.
    #[default]
    Proportional,
    /// Coin-flip each sub-operator in order with its weight; the first hit runs.
    /// When every flip misses, the last sub-operator runs.
    FirstMatch,
    /// Coin-flip each sub-operator with its weight; every hit runs, in order.
    Independent,
}

/// Crossover and mutation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariationConfig {
    /// Probability that a parent pair is recombined.
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    /// Probability that a genome is mutated.
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Extrapolation coefficient for segment and hypercube crossover.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Half-width of uniform mutation, relative to the gene magnitude.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// Standard deviation of normal mutation, relative to the gene magnitude.
    #[serde(default = "default_sigma")]
    pub sigma: f64,
    #[serde(default = "default_operator_weight")]
    pub segment_weight: f64,
    #[serde(default = "default_operator_weight")]
    pub hypercube_weight: f64,
    #[serde(default = "default_operator_weight")]
    pub uniform_weight: f64,
    #[serde(default = "default_operator_weight")]
    pub det_uniform_weight: f64,
    #[serde(default = "default_operator_weight")]
    pub normal_weight: f64,
    #[serde(default)]
    pub crossover_dispatch: DispatchPolicy,
    #[serde(default = "default_mutation_dispatch")]
    pub mutation_dispatch: DispatchPolicy,
}

impl Default for VariationConfig {
    fn default() -> Self {
        Self {
            crossover_rate: default_crossover_rate(),
            mutation_rate: default_mutation_rate(),
            alpha: default_alpha(),
            epsilon: default_epsilon(),
            sigma: default_sigma(),
            segment_weight: default_operator_weight(),
            hypercube_weight: default_operator_weight(),
            uniform_weight: default_operator_weight(),
            det_uniform_weight: default_operator_weight(),
            normal_weight: default_operator_weight(),
            crossover_dispatch: DispatchPolicy::default(),
            mutation_dispatch: default_mutation_dispatch(),
        }
    }
}

fn default_crossover_rate() -> f64 {
    0.8
}
fn default_mutation_rate() -> f64 {
    0.5
}
fn default_alpha() -> f64 {
    10.0
}
fn default_epsilon() -> f64 {
    0.1
}
fn default_sigma() -> f64 {
    0.3
}
fn default_operator_weight() -> f64 {
    0.5
}
fn default_mutation_dispatch() -> DispatchPolicy {
    DispatchPolicy::FirstMatch
}

/// Output artifacts and console reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Best genome and fitted trajectory.
    #[serde(default = "default_results_path")]
    pub results_path: String,
    /// Per-generation statistics table.
    #[serde(default = "default_stats_path")]
    pub stats_path: String,
    /// Minimum wall-clock seconds between console progress lines.
    #[serde(default = "default_print_every_secs")]
    pub print_every_secs: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: default_results_path(),
            stats_path: default_stats_path(),
            print_every_secs: default_print_every_secs(),
        }
    }
}

fn default_results_path() -> String {
    "results.xy".to_string()
}
fn default_stats_path() -> String {
    "stats.xy".to_string()
}
fn default_print_every_secs() -> u64 {
    10
}

impl OptimizerConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population.size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        let rate = self.population.selection_rate;
        if !rate.is_finite() || rate > MAX_SELECTION_RATE || self.population.selection_count() == 0
        {
            return Err(ConfigError::InvalidSelectionRate(
                self.population.selection_rate,
            ));
        }

        let check_probability = |value: f64, name: &'static str| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::InvalidProbability { name, value })
            }
        };

        check_probability(self.population.tournament_rate, "tournament_rate")?;
        check_probability(self.variation.crossover_rate, "crossover_rate")?;
        check_probability(self.variation.mutation_rate, "mutation_rate")?;

        let check_non_negative = |value: f64, name: &'static str| {
            if value >= 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::InvalidCoefficient { name, value })
            }
        };

        let v = &self.variation;
        check_non_negative(v.alpha, "alpha")?;
        check_non_negative(v.epsilon, "epsilon")?;
        check_non_negative(v.sigma, "sigma")?;
        check_non_negative(v.segment_weight, "segment_weight")?;
        check_non_negative(v.hypercube_weight, "hypercube_weight")?;
        check_non_negative(v.uniform_weight, "uniform_weight")?;
        check_non_negative(v.det_uniform_weight, "det_uniform_weight")?;
        check_non_negative(v.normal_weight, "normal_weight")?;

        if v.segment_weight + v.hypercube_weight <= 0.0 {
            return Err(ConfigError::NoOperatorWeight("crossover"));
        }
        if v.uniform_weight + v.det_uniform_weight + v.normal_weight <= 0.0 {
            return Err(ConfigError::NoOperatorWeight("mutation"));
        }

        if self
            .seed_genes
            .to_genes()
            .iter()
            .any(|gene| !gene.is_finite())
        {
            return Err(ConfigError::NonFiniteSeed);
        }

        if self.output.print_every_secs == 0 {
            return Err(ConfigError::InvalidPrintInterval);
        }

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be non-zero")]
    EmptyPopulation,
    #[error(
        "Selection rate {0} must be finite, at most {max}, and select at least one parent",
        max = MAX_SELECTION_RATE
    )]
    InvalidSelectionRate(f64),
    #[error("Probability {name} = {value} must lie in [0, 1]")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("Coefficient {name} = {value} must be finite and non-negative")]
    InvalidCoefficient { name: &'static str, value: f64 },
    #[error("All {0} operator weights are zero")]
    NoOperatorWeight(&'static str),
    #[error("Seed genes must be finite")]
    NonFiniteSeed,
    #[error("Print interval must be positive")]
    InvalidPrintInterval,
}
