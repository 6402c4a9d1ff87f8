//! Variation pipeline: weighted crossover and mutation operators.

use crate::schema::{DispatchPolicy, VariationConfig};

use super::genome::{Genome, GenomeRng};

/// Crossover sub-operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossoverOp {
    Segment,
    Hypercube,
}

/// Mutation sub-operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    Uniform,
    DetUniform,
    Normal,
}

/// Combined operator: an ordered list of `(operator, weight)` pairs.
#[derive(Debug, Clone)]
pub struct WeightedOperators<Op> {
    entries: Vec<(Op, f64)>,
    policy: DispatchPolicy,
}

impl<Op: Copy> WeightedOperators<Op> {
    pub fn new(policy: DispatchPolicy) -> Self {
        Self {
            entries: Vec::new(),
            policy,
        }
    }

    /// Append an operator with a relative weight.
    pub fn with(mut self, op: Op, weight: f64) -> Self {
        self.entries.push((op, weight));
        self
    }

    #[inline]
    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    #[inline]
    pub fn entries(&self) -> &[(Op, f64)] {
        &self.entries
    }

    /// Choose which operators run for one invocation, in application order.
    ///
    /// `Proportional` and `FirstMatch` always return exactly one operator
    /// (unless the list is empty); `Independent` returns zero or more.
    pub fn dispatch(&self, rng: &mut GenomeRng) -> Vec<Op> {
        match self.policy {
            DispatchPolicy::Proportional => {
                let total: f64 = self.entries.iter().map(|(_, w)| w.max(0.0)).sum();
                if total <= 0.0 {
                    return Vec::new();
                }

                let target = rng.unit() * total;
                let mut cumulative = 0.0;
                for &(op, weight) in &self.entries {
                    cumulative += weight.max(0.0);
                    if target < cumulative {
                        return vec![op];
                    }
                }
                // Rounding left the draw past the end: take the last weighted op.
                self.entries
                    .iter()
                    .rev()
                    .find(|(_, w)| *w > 0.0)
                    .map(|&(op, _)| vec![op])
                    .unwrap_or_default()
            }
            DispatchPolicy::FirstMatch => {
                for &(op, weight) in &self.entries {
                    if rng.flip(weight) {
                        return vec![op];
                    }
                }
                self.entries
                    .last()
                    .map(|&(op, _)| vec![op])
                    .unwrap_or_default()
            }
            DispatchPolicy::Independent => self
                .entries
                .iter()
                .filter(|(_, weight)| rng.flip(*weight))
                .map(|&(op, _)| op)
                .collect(),
        }
    }
}

/// Crossover with probability `crossover_rate` on consecutive pairs, then
/// mutation with probability `mutation_rate` on every genome.
#[derive(Debug, Clone)]
pub struct Variation {
    crossover_rate: f64,
    mutation_rate: f64,
    alpha: f64,
    epsilon: f64,
    sigma: f64,
    crossover: WeightedOperators<CrossoverOp>,
    mutation: WeightedOperators<MutationOp>,
}

impl Variation {
    pub fn from_config(config: &VariationConfig) -> Self {
        Self {
            crossover_rate: config.crossover_rate,
            mutation_rate: config.mutation_rate,
            alpha: config.alpha,
            epsilon: config.epsilon,
            sigma: config.sigma,
            crossover: WeightedOperators::new(config.crossover_dispatch)
                .with(CrossoverOp::Segment, config.segment_weight)
                .with(CrossoverOp::Hypercube, config.hypercube_weight),
            mutation: WeightedOperators::new(config.mutation_dispatch)
                .with(MutationOp::Uniform, config.uniform_weight)
                .with(MutationOp::DetUniform, config.det_uniform_weight)
                .with(MutationOp::Normal, config.normal_weight),
        }
    }

    /// Recombine a pair in place with the dispatched crossover operator(s).
    pub fn crossover(&self, first: &mut Genome, second: &mut Genome, rng: &mut GenomeRng) {
        for op in self.crossover.dispatch(rng) {
            match op {
                CrossoverOp::Segment => rng.segment_crossover(first, second, self.alpha),
                CrossoverOp::Hypercube => rng.hypercube_crossover(first, second, self.alpha),
            }
        }
    }

    /// Mutate a genome in place with the dispatched mutation operator(s).
    pub fn mutate(&self, genome: &mut Genome, rng: &mut GenomeRng) {
        for op in self.mutation.dispatch(rng) {
            match op {
                MutationOp::Uniform => rng.uniform_mutation(genome, self.epsilon),
                MutationOp::DetUniform => rng.det_uniform_mutation(genome, self.epsilon),
                MutationOp::Normal => rng.normal_mutation(genome, self.sigma),
            }
        }
    }

    /// Apply the pipeline to selected parents, turning them into offspring.
    ///
    /// Changed genomes lose their cached fitness; an odd trailing genome is
    /// only eligible for mutation.
    pub fn apply(&self, offspring: &mut [Genome], rng: &mut GenomeRng) {
        for pair in offspring.chunks_exact_mut(2) {
            if rng.flip(self.crossover_rate) {
                let (first, second) = pair.split_at_mut(1);
                self.crossover(&mut first[0], &mut second[0], rng);
            }
        }

        for genome in offspring.iter_mut() {
            if rng.flip(self.mutation_rate) {
                self.mutate(genome, rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(policy: DispatchPolicy) -> WeightedOperators<MutationOp> {
        WeightedOperators::new(policy)
            .with(MutationOp::Uniform, 0.5)
            .with(MutationOp::DetUniform, 0.5)
            .with(MutationOp::Normal, 0.5)
    }

    fn counts(picks: &[Vec<MutationOp>]) -> [usize; 3] {
        let mut counts = [0; 3];
        for pick in picks {
            for op in pick {
                counts[*op as usize] += 1;
            }
        }
        counts
    }

    #[test]
    fn test_proportional_picks_exactly_one() {
        let set = ops(DispatchPolicy::Proportional);
        let mut rng = GenomeRng::new(1);
        let picks: Vec<_> = (0..3000).map(|_| set.dispatch(&mut rng)).collect();

        assert!(picks.iter().all(|p| p.len() == 1));
        // Equal weights: roughly a third each.
        for count in counts(&picks) {
            assert!((800..1200).contains(&count), "count = {count}");
        }
    }

    #[test]
    fn test_proportional_skips_zero_weight() {
        let set = WeightedOperators::new(DispatchPolicy::Proportional)
            .with(CrossoverOp::Segment, 0.0)
            .with(CrossoverOp::Hypercube, 0.5);
        let mut rng = GenomeRng::new(1);
        for _ in 0..200 {
            assert_eq!(set.dispatch(&mut rng), vec![CrossoverOp::Hypercube]);
        }
    }

    #[test]
    fn test_first_match_prefers_earlier_operators() {
        let set = ops(DispatchPolicy::FirstMatch);
        let mut rng = GenomeRng::new(2);
        let picks: Vec<_> = (0..4000).map(|_| set.dispatch(&mut rng)).collect();

        assert!(picks.iter().all(|p| p.len() == 1));
        // Expected shares: 1/2, 1/4, 1/4 (the last op also absorbs misses).
        let [uniform, det, normal] = counts(&picks);
        assert!((1800..2200).contains(&uniform), "uniform = {uniform}");
        assert!((850..1150).contains(&det), "det = {det}");
        assert!((850..1150).contains(&normal), "normal = {normal}");
    }

    #[test]
    fn test_first_match_with_certain_weight() {
        let set = WeightedOperators::new(DispatchPolicy::FirstMatch)
            .with(MutationOp::DetUniform, 1.0)
            .with(MutationOp::Normal, 1.0);
        let mut rng = GenomeRng::new(3);
        for _ in 0..100 {
            assert_eq!(set.dispatch(&mut rng), vec![MutationOp::DetUniform]);
        }
    }

    #[test]
    fn test_independent_can_apply_several() {
        let set = ops(DispatchPolicy::Independent);
        let mut rng = GenomeRng::new(4);
        let picks: Vec<_> = (0..2000).map(|_| set.dispatch(&mut rng)).collect();

        assert!(picks.iter().any(|p| p.is_empty()));
        assert!(picks.iter().any(|p| p.len() == 3));
        for pick in &picks {
            // Application order follows the list order.
            let order: Vec<usize> = pick.iter().map(|op| *op as usize).collect();
            assert!(order.windows(2).all(|w| w[0] < w[1]));
        }
        for count in counts(&picks) {
            assert!((850..1150).contains(&count), "count = {count}");
        }
    }

    #[test]
    fn test_zero_mutation_rate_leaves_genomes_untouched() {
        let config = VariationConfig {
            crossover_rate: 0.0,
            mutation_rate: 0.0,
            ..Default::default()
        };
        let variation = Variation::from_config(&config);
        let mut rng = GenomeRng::new(5);

        let original = vec![
            Genome::with_fitness([5.49e12, 1.7e5, 3.56, 0.23], -0.1),
            Genome::with_fitness([1.0, 2.0, 3.0, 4.0], -0.2),
            Genome::with_fitness([4.0, 3.0, 2.0, 1.0], -0.3),
        ];
        let mut offspring = original.clone();
        variation.apply(&mut offspring, &mut rng);

        assert_eq!(offspring, original);
    }

    #[test]
    fn test_certain_variation_invalidates_everything() {
        let config = VariationConfig {
            crossover_rate: 1.0,
            mutation_rate: 1.0,
            ..Default::default()
        };
        let variation = Variation::from_config(&config);
        let mut rng = GenomeRng::new(6);

        let mut offspring: Vec<Genome> = (0..5)
            .map(|i| Genome::with_fitness([1.0 + i as f64, 2.0, 3.0, 0.5], -1.0))
            .collect();
        variation.apply(&mut offspring, &mut rng);

        assert!(offspring.iter().all(|g| !g.is_evaluated()));
    }

    #[test]
    fn test_crossover_only_touches_pairs() {
        let config = VariationConfig {
            crossover_rate: 1.0,
            mutation_rate: 0.0,
            ..Default::default()
        };
        let variation = Variation::from_config(&config);
        let mut rng = GenomeRng::new(7);

        let mut offspring: Vec<Genome> = (0..3)
            .map(|i| Genome::with_fitness([1.0 + i as f64, 2.0, 3.0, 0.5], -1.0))
            .collect();
        variation.apply(&mut offspring, &mut rng);

        assert!(!offspring[0].is_evaluated());
        assert!(!offspring[1].is_evaluated());
        assert_eq!(
            offspring[2],
            Genome::with_fitness([3.0, 2.0, 3.0, 0.5], -1.0)
        );
    }
}
