//! Benchmarks for fitness evaluation and generation steps.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use pyrolysis_ga::{
    compute::{
        ArrheniusModel, ForwardModel,
        evolution::{EvolutionEngine, FitnessEvaluator},
    },
    schema::{
        ExperimentalDataset, ExperimentalRecord, KineticParams, OptimizerConfig, PopulationConfig,
    },
};

/// Synthetic 10 K/min ramp from 300 K, sampled every `3600 / samples` seconds,
/// with mass fractions simulated from the default parameters.
fn synthetic_dataset(samples: usize) -> ExperimentalDataset {
    let dt = 3600.0 / samples as f64;
    let ramp: Vec<ExperimentalRecord> = (0..samples)
        .map(|i| {
            let t = i as f64 * dt;
            ExperimentalRecord::new(t, 300.0 + t / 6.0, 1.0)
        })
        .collect();
    let ramp = ExperimentalDataset::new(ramp).expect("valid ramp");

    let mut mass = vec![0.0; samples];
    ArrheniusModel::default().simulate(&KineticParams::default(), &ramp, &mut mass);

    let records = ramp
        .iter()
        .zip(&mass)
        .map(|(r, &y)| ExperimentalRecord::new(r.time, r.temperature, y))
        .collect();
    ExperimentalDataset::new(records).expect("valid dataset")
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for samples in [50, 200, 1000] {
        let dataset = synthetic_dataset(samples);
        let mut evaluator = FitnessEvaluator::new(ArrheniusModel::default(), &dataset);
        let params = KineticParams {
            a: 4.0e12,
            ..KineticParams::default()
        };

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_samples", samples)),
            &samples,
            |b, _| {
                b.iter(|| evaluator.evaluate(black_box(&params)));
            },
        );
    }

    group.finish();
}

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");
    let dataset = synthetic_dataset(200);

    for size in [20, 100] {
        let config = OptimizerConfig {
            population: PopulationConfig {
                size,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut engine = EvolutionEngine::new(config, ArrheniusModel::default(), &dataset)
            .expect("valid config");
        engine.initialize();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("population_{}", size)),
            &size,
            |b, _| {
                b.iter(|| {
                    black_box(engine.step_generation());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_generation);
criterion_main!(benches);
