//! Fitness evaluation against experimental data.

use crate::compute::ForwardModel;
use crate::schema::{ExperimentalDataset, KineticParams};

use super::genome::Genome;

/// Fitness assigned when the forward model yields non-finite values.
pub const DIVERGED_FITNESS: f64 = -1.0e120;

/// Lowest fitness a finite evaluation can report.
///
/// Keeps every finite result strictly above [`DIVERGED_FITNESS`] and keeps
/// squared fitness values representable when computing statistics.
pub const FITNESS_FLOOR: f64 = -1.0e100;

/// Negative sum of squared residuals, skipping the first sample.
///
/// Sample 0 is the initial condition and is not a fit target.
pub fn residual_fitness(dataset: &ExperimentalDataset, trajectory: &[f64]) -> f64 {
    -dataset
        .iter()
        .zip(trajectory)
        .skip(1)
        .map(|(record, simulated)| {
            let delta = record.mass_fraction - simulated;
            delta * delta
        })
        .sum::<f64>()
}

/// Scores genomes by simulating them against a dataset.
///
/// Owns one trajectory buffer that is overwritten by every evaluation. The
/// `&mut self` receiver keeps evaluations sequential; evaluating in parallel
/// would need one evaluator (and buffer) per worker.
pub struct FitnessEvaluator<'a, M> {
    model: M,
    dataset: &'a ExperimentalDataset,
    trajectory: Vec<f64>,
    evaluations: u64,
}

impl<'a, M: ForwardModel> FitnessEvaluator<'a, M> {
    /// Create a new fitness evaluator.
    pub fn new(model: M, dataset: &'a ExperimentalDataset) -> Self {
        Self {
            model,
            dataset,
            trajectory: vec![0.0; dataset.len()],
            evaluations: 0,
        }
    }

    /// Run the forward model and return the simulated trajectory.
    ///
    /// Entries the model leaves unwritten read as NaN.
    pub fn simulate(&mut self, params: &KineticParams) -> &[f64] {
        self.trajectory.fill(f64::NAN);
        self.model.simulate(params, self.dataset, &mut self.trajectory);
        &self.trajectory
    }

    /// Fitness of `params`. Always finite.
    pub fn evaluate(&mut self, params: &KineticParams) -> f64 {
        self.evaluations += 1;
        self.simulate(params);
        let fitness = residual_fitness(self.dataset, &self.trajectory);

        if fitness.is_finite() {
            fitness.max(FITNESS_FLOOR)
        } else {
            DIVERGED_FITNESS
        }
    }

    /// Evaluate a genome and cache the result on it.
    pub fn evaluate_genome(&mut self, genome: &mut Genome) -> f64 {
        let fitness = self.evaluate(&genome.params());
        genome.set_fitness(fitness);
        fitness
    }

    /// Evaluate every genome whose fitness is stale. Returns how many ran.
    pub fn evaluate_pending(&mut self, genomes: &mut [Genome]) -> usize {
        let mut count = 0;
        for genome in genomes.iter_mut().filter(|g| !g.is_evaluated()) {
            self.evaluate_genome(genome);
            count += 1;
        }
        count
    }

    /// Number of fitness evaluations performed.
    #[inline]
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    #[inline]
    pub fn dataset(&self) -> &'a ExperimentalDataset {
        self.dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::ArrheniusModel;
    use crate::schema::ExperimentalRecord;
    use proptest::prelude::*;

    fn dataset() -> ExperimentalDataset {
        ExperimentalDataset::new(vec![
            ExperimentalRecord::new(0.0, 300.0, 1.0),
            ExperimentalRecord::new(10.0, 400.0, 0.8),
            ExperimentalRecord::new(20.0, 500.0, 0.5),
        ])
        .unwrap()
    }

    fn constant_model(p: &KineticParams, _: &ExperimentalDataset, out: &mut [f64]) {
        out.fill(p.yinf);
    }

    #[test]
    fn test_residuals_skip_initial_sample() {
        let dataset = dataset();
        let mut evaluator = FitnessEvaluator::new(constant_model, &dataset);
        let params = KineticParams::from_genes(&[0.0, 0.0, 0.0, 0.5]);

        // Sample 0 (1.0 vs 0.5) would add 0.25 if it were counted.
        let fitness = evaluator.evaluate(&params);
        assert!((fitness - (-0.09)).abs() < 1e-12);
        assert_eq!(evaluator.evaluations(), 1);
    }

    #[test]
    fn test_perfect_fit_scores_zero() {
        let dataset = dataset();
        let model = |_: &KineticParams, d: &ExperimentalDataset, out: &mut [f64]| {
            for (o, r) in out.iter_mut().zip(d.iter()) {
                *o = r.mass_fraction;
            }
        };
        let mut evaluator = FitnessEvaluator::new(model, &dataset);
        assert_eq!(evaluator.evaluate(&KineticParams::default()), 0.0);
    }

    #[test]
    fn test_divergence_returns_sentinel() {
        let dataset = dataset();
        let model = |_: &KineticParams, _: &ExperimentalDataset, out: &mut [f64]| {
            out.fill(f64::INFINITY);
        };
        let mut evaluator = FitnessEvaluator::new(model, &dataset);
        assert_eq!(evaluator.evaluate(&KineticParams::default()), DIVERGED_FITNESS);
    }

    #[test]
    fn test_unwritten_samples_count_as_divergence() {
        let dataset = dataset();
        let model = |_: &KineticParams, _: &ExperimentalDataset, out: &mut [f64]| {
            out[0] = 1.0;
        };
        let mut evaluator = FitnessEvaluator::new(model, &dataset);
        assert_eq!(evaluator.evaluate(&KineticParams::default()), DIVERGED_FITNESS);
    }

    #[test]
    fn test_huge_finite_residuals_stay_above_sentinel() {
        let dataset = dataset();
        let model = |_: &KineticParams, _: &ExperimentalDataset, out: &mut [f64]| {
            out.fill(1.0e120);
        };
        let mut evaluator = FitnessEvaluator::new(model, &dataset);
        let fitness = evaluator.evaluate(&KineticParams::default());
        assert_eq!(fitness, FITNESS_FLOOR);
        assert!(fitness > DIVERGED_FITNESS);
    }

    #[test]
    fn test_evaluate_pending_skips_evaluated() {
        let dataset = dataset();
        let mut evaluator = FitnessEvaluator::new(constant_model, &dataset);
        let mut genomes = vec![
            Genome::with_fitness([0.0, 0.0, 0.0, 0.5], 123.0),
            Genome::new([0.0, 0.0, 0.0, 0.5]),
        ];

        assert_eq!(evaluator.evaluate_pending(&mut genomes), 1);
        assert_eq!(genomes[0].fitness_value(), Some(123.0));
        assert!((genomes[1].fitness_value().unwrap() + 0.09).abs() < 1e-12);
    }

    #[test]
    fn test_dataset_untouched() {
        let dataset = dataset();
        let before = dataset.clone();
        let mut evaluator = FitnessEvaluator::new(ArrheniusModel::default(), &dataset);
        evaluator.evaluate(&KineticParams::default());
        assert_eq!(*evaluator.dataset(), before);
    }

    proptest! {
        #[test]
        fn prop_fitness_is_always_finite(
            a in prop::num::f64::ANY,
            e in prop::num::f64::ANY,
            ns in prop::num::f64::ANY,
            yinf in prop::num::f64::ANY,
        ) {
            let dataset = dataset();
            let mut evaluator = FitnessEvaluator::new(ArrheniusModel::default(), &dataset);
            let fitness = evaluator.evaluate(&KineticParams { a, e, ns, yinf });
            prop_assert!(fitness.is_finite());
            prop_assert!(fitness <= 0.0);
        }
    }
}
