//! Genome representation and the random operations applied to it.
//!
//! Provides seeded random generation, the initial population, and the
//! crossover/mutation primitives combined by the variation pipeline.

use std::cmp::Ordering;
use std::fmt;

use rand::prelude::*;

use crate::compute::ForwardModel;
use crate::schema::{GENE_COUNT, KineticParams};

use super::fitness::FitnessEvaluator;

/// Cached fitness of a genome.
///
/// Any change to the genes resets it to `Unevaluated`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Fitness {
    #[default]
    Unevaluated,
    Evaluated(f64),
}

impl Fitness {
    #[inline]
    pub fn value(self) -> Option<f64> {
        match self {
            Fitness::Unevaluated => None,
            Fitness::Evaluated(value) => Some(value),
        }
    }

    #[inline]
    pub fn is_evaluated(self) -> bool {
        matches!(self, Fitness::Evaluated(_))
    }

    /// Total order: unevaluated below everything, evaluated by `f64::total_cmp`.
    pub fn total_cmp(&self, other: &Fitness) -> Ordering {
        match (self, other) {
            (Fitness::Unevaluated, Fitness::Unevaluated) => Ordering::Equal,
            (Fitness::Unevaluated, Fitness::Evaluated(_)) => Ordering::Less,
            (Fitness::Evaluated(_), Fitness::Unevaluated) => Ordering::Greater,
            (Fitness::Evaluated(a), Fitness::Evaluated(b)) => a.total_cmp(b),
        }
    }
}

/// Candidate kinetic parameter vector `[A, E, NS, yinf]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Genome {
    genes: [f64; GENE_COUNT],
    fitness: Fitness,
}

impl Genome {
    /// Create an unevaluated genome.
    pub fn new(genes: [f64; GENE_COUNT]) -> Self {
        Self {
            genes,
            fitness: Fitness::Unevaluated,
        }
    }

    /// Create a genome with a known fitness.
    pub fn with_fitness(genes: [f64; GENE_COUNT], fitness: f64) -> Self {
        Self {
            genes,
            fitness: Fitness::Evaluated(fitness),
        }
    }

    #[inline]
    pub fn genes(&self) -> &[f64; GENE_COUNT] {
        &self.genes
    }

    /// Mutable access to the genes. Invalidates the cached fitness.
    #[inline]
    pub fn genes_mut(&mut self) -> &mut [f64; GENE_COUNT] {
        self.fitness = Fitness::Unevaluated;
        &mut self.genes
    }

    #[inline]
    pub fn params(&self) -> KineticParams {
        KineticParams::from_genes(&self.genes)
    }

    #[inline]
    pub fn fitness(&self) -> Fitness {
        self.fitness
    }

    #[inline]
    pub fn fitness_value(&self) -> Option<f64> {
        self.fitness.value()
    }

    #[inline]
    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_evaluated()
    }

    pub(crate) fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Fitness::Evaluated(fitness);
    }

    /// Compare by fitness (see [`Fitness::total_cmp`]).
    #[inline]
    pub fn cmp_fitness(&self, other: &Genome) -> Ordering {
        self.fitness.total_cmp(&other.fitness)
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fitness {
            Fitness::Evaluated(value) => write!(f, "{value}")?,
            Fitness::Unevaluated => write!(f, "?")?,
        }
        write!(f, " {}", GENE_COUNT)?;
        for gene in &self.genes {
            write!(f, " {gene}")?;
        }
        Ok(())
    }
}

/// Sort genomes by fitness, best first.
pub fn sort_by_fitness(genomes: &mut [Genome]) {
    genomes.sort_by(|a, b| b.cmp_fitness(a));
}

/// Random number generator wrapper for genome operations.
///
/// The only source of randomness in a run; seeded once and passed explicitly
/// to initialization, selection and variation.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Bernoulli trial. `p` is clamped to [0, 1].
    #[inline]
    pub fn flip(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Uniform index in `0..n`. `n` must be non-zero.
    #[inline]
    pub fn index(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    /// Uniform sample in [0, 1).
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    /// Uniform sample between `low` and `high`.
    ///
    /// Never panics: non-finite bounds propagate into the sample.
    #[inline]
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.unit()
    }

    /// Standard normal sample.
    #[inline]
    pub fn standard_normal(&mut self) -> f64 {
        self.rng.sample(rand_distr::StandardNormal)
    }

    /// Perturb seed genes: `seed + N(0, seed * U(0, 2))` per gene.
    pub fn perturbed_genes(&mut self, seed: &KineticParams) -> [f64; GENE_COUNT] {
        seed.to_genes().map(|gene| {
            let scale = gene * self.uniform(0.0, 2.0);
            gene + self.standard_normal() * scale
        })
    }

    /// Segment (BLX-style line) crossover.
    ///
    /// Per gene, draws `t` in `[-alpha, 1 + alpha]` and sets the children to
    /// `t * p1 + (1 - t) * p2` and `(1 - t) * p1 + t * p2`.
    pub fn segment_crossover(&mut self, first: &mut Genome, second: &mut Genome, alpha: f64) {
        let a = first.genes_mut();
        let b = second.genes_mut();
        for (x, y) in a.iter_mut().zip(b.iter_mut()) {
            let t = self.uniform(-alpha, 1.0 + alpha);
            let (p1, p2) = (*x, *y);
            *x = t * p1 + (1.0 - t) * p2;
            *y = (1.0 - t) * p1 + t * p2;
        }
    }

    /// Hypercube crossover.
    ///
    /// Each child gene is drawn uniformly from
    /// `[min - alpha * range, max + alpha * range]` of the parents' genes.
    pub fn hypercube_crossover(&mut self, first: &mut Genome, second: &mut Genome, alpha: f64) {
        let a = first.genes_mut();
        let b = second.genes_mut();
        for (x, y) in a.iter_mut().zip(b.iter_mut()) {
            let low = x.min(*y);
            let high = x.max(*y);
            let range = high - low;
            let (low, high) = (low - alpha * range, high + alpha * range);
            *x = self.uniform(low, high);
            *y = self.uniform(low, high);
        }
    }

    /// Uniform mutation of every gene within `±epsilon * |gene|`.
    pub fn uniform_mutation(&mut self, genome: &mut Genome, epsilon: f64) {
        for gene in genome.genes_mut().iter_mut() {
            *gene = self.perturb_uniform(*gene, epsilon);
        }
    }

    /// Uniform mutation of one randomly chosen gene within `±epsilon * |gene|`.
    pub fn det_uniform_mutation(&mut self, genome: &mut Genome, epsilon: f64) {
        let idx = self.index(GENE_COUNT);
        let genes = genome.genes_mut();
        genes[idx] = self.perturb_uniform(genes[idx], epsilon);
    }

    /// Gaussian mutation of every gene with standard deviation `sigma * |gene|`.
    pub fn normal_mutation(&mut self, genome: &mut Genome, sigma: f64) {
        for gene in genome.genes_mut().iter_mut() {
            let delta = self.standard_normal() * sigma * gene.abs();
            *gene += delta;
        }
    }

    #[inline]
    fn perturb_uniform(&mut self, gene: f64, epsilon: f64) -> f64 {
        let half_width = epsilon * gene.abs();
        self.uniform(gene - half_width, gene + half_width)
    }
}

/// Build the starting population by perturbing `seed`.
///
/// Every genome is evaluated before it is added. Genes are not clamped;
/// unphysical values are penalized through fitness only.
pub fn initialize_population<M: ForwardModel>(
    size: usize,
    seed: &KineticParams,
    rng: &mut GenomeRng,
    evaluator: &mut FitnessEvaluator<'_, M>,
) -> Vec<Genome> {
    (0..size)
        .map(|_| {
            let mut genome = Genome::new(rng.perturbed_genes(seed));
            evaluator.evaluate_genome(&mut genome);
            genome
        })
        .collect()
}
