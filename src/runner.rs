//! Run driver: one complete optimization with statistics and result artifacts.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::compute::ForwardModel;
use crate::compute::evolution::{
    DIVERGED_FITNESS, EvolutionEngine, EvolutionResult, Genome, ResultsWriter, StatsLog,
    TimedMonitor,
};
use crate::error::OptimizerError;
use crate::schema::{ExperimentalDataset, OptimizerConfig};

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Initial population, best first.
    pub initial_population: Vec<Genome>,
    /// Final state of the search.
    pub result: EvolutionResult,
    /// Simulated trajectory of the best genome.
    pub best_trajectory: Vec<f64>,
    pub stats_path: PathBuf,
    pub results_path: PathBuf,
}

/// Fit `model` to `dataset`.
///
/// Both output files are opened before the first generation, so an invalid
/// configuration or an unwritable path fails before any evaluation runs.
pub fn run<M: ForwardModel>(
    config: &OptimizerConfig,
    dataset: &ExperimentalDataset,
    model: M,
) -> Result<RunSummary, OptimizerError> {
    config.validate()?;

    // Opened before the stats log so a bad results path leaves stats untouched.
    let results = ResultsWriter::create(&config.output.results_path)?;
    let mut stats_log = StatsLog::create(&config.output.stats_path)?;
    let mut monitor = TimedMonitor::new(Duration::from_secs(config.output.print_every_secs));

    log::info!(
        "Fitting {} samples: population {}, {} generations, seed {}",
        dataset.len(),
        config.population.size,
        config.population.max_generations,
        config.random_seed
    );

    let start = Instant::now();
    let mut engine = EvolutionEngine::new(config.clone(), model, dataset)?;

    let stats = *engine.initialize();
    stats_log.append(&stats)?;
    monitor.observe(&stats);
    let initial_population = engine.population().to_vec();

    while !engine.should_stop() {
        let stats = *engine.step_generation();
        stats_log.append(&stats)?;
        monitor.observe(&stats);
    }

    let result = engine.result(start.elapsed().as_secs_f64());
    let stats_path = stats_log.finish()?;

    let best = engine
        .best()
        .cloned()
        .ok_or(OptimizerError::EmptyPopulation)?;
    if best.fitness_value().is_none_or(|f| f <= DIVERGED_FITNESS) {
        log::warn!("Best genome diverged; no parameters reproduce the data: {best}");
    }

    let best_trajectory = engine.evaluator_mut().simulate(&best.params()).to_vec();
    let results_path = results.commit(&best, dataset, &best_trajectory)?;

    log::info!(
        "Finished {} generations ({} evaluations) in {:.2}s, best fitness {:e}",
        result.stats.generations,
        result.stats.total_evaluations,
        result.stats.elapsed_seconds,
        result.stats.best_fitness
    );

    Ok(RunSummary {
        initial_population,
        result,
        best_trajectory,
        stats_path,
        results_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ExperimentalRecord, KineticParams, PopulationConfig};
    use std::fs;
    use std::path::Path;

    fn decay_model(p: &KineticParams, d: &ExperimentalDataset, out: &mut [f64]) {
        for (o, r) in out.iter_mut().zip(d.iter()) {
            *o = p.yinf + (1.0 - p.yinf) * (-p.a * r.time).exp();
        }
    }

    fn dataset() -> ExperimentalDataset {
        let records = (0..10)
            .map(|i| {
                let t = i as f64;
                ExperimentalRecord::new(t, 300.0 + 5.0 * t, 0.4 + 0.6 * (-0.3 * t).exp())
            })
            .collect();
        ExperimentalDataset::new(records).unwrap()
    }

    fn config_in(dir: &Path) -> OptimizerConfig {
        let mut config = OptimizerConfig {
            population: PopulationConfig {
                size: 8,
                max_generations: 5,
                ..Default::default()
            },
            seed_genes: KineticParams {
                a: 0.2,
                e: 1.0,
                ns: 1.0,
                yinf: 0.5,
            },
            ..Default::default()
        };
        config.output.stats_path = dir.join("stats.xy").display().to_string();
        config.output.results_path = dir.join("results.xy").display().to_string();
        config
    }

    #[test]
    fn test_run_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let dataset = dataset();

        let summary = run(&config, &dataset, decay_model).unwrap();

        assert_eq!(summary.initial_population.len(), 8);
        assert_eq!(summary.result.population.len(), 8);
        assert_eq!(summary.best_trajectory.len(), dataset.len());

        // Generation 0 plus one row per generation.
        let stats = fs::read_to_string(&summary.stats_path).unwrap();
        assert_eq!(stats.lines().count(), 6);
        assert!(stats.lines().all(|l| l.split_whitespace().count() == 4));

        let results = fs::read_to_string(&summary.results_path).unwrap();
        let lines: Vec<&str> = results.lines().collect();
        assert!(lines[0].starts_with("Fitness:"));
        assert_eq!(lines[1], "Time,Temp,Exp,Model");
        assert_eq!(lines.len(), 2 + dataset.len());
    }

    #[test]
    fn test_run_never_worsens_initial_best() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let dataset = dataset();

        let summary = run(&config, &dataset, decay_model).unwrap();
        let initial_best = summary.initial_population[0].fitness_value().unwrap();
        assert!(summary.result.stats.best_fitness >= initial_best);
    }

    #[test]
    fn test_invalid_config_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.population.size = 0;

        let result = run(&config, &dataset(), decay_model);
        assert!(matches!(result, Err(OptimizerError::Config(_))));
        assert!(!dir.path().join("stats.xy").exists());
        assert!(!dir.path().join("results.xy").exists());
    }

    #[test]
    fn test_unwritable_output_fails_before_search() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.output.results_path = dir
            .path()
            .join("missing")
            .join("results.xy")
            .display()
            .to_string();

        let stats_path = dir.path().join("stats.xy");
        fs::write(&stats_path, "0 -1 -2 0.5\n").unwrap();

        let model = |_: &KineticParams, _: &ExperimentalDataset, _: &mut [f64]| {
            panic!("model must not run");
        };
        let result = run(&config, &dataset(), model);
        assert!(matches!(result, Err(OptimizerError::Io { .. })));
        // Statistics from an earlier run survive.
        assert_eq!(fs::read_to_string(&stats_path).unwrap(), "0 -1 -2 0.5\n");
    }

    #[test]
    fn test_diverging_model_still_completes() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let model = |_: &KineticParams, _: &ExperimentalDataset, out: &mut [f64]| {
            out.fill(f64::NAN);
        };

        let summary = run(&config, &dataset(), model).unwrap();
        assert_eq!(summary.result.stats.best_fitness, DIVERGED_FITNESS);
        assert!(summary.results_path.exists());
    }
}
