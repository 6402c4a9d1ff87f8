//! Pyrolysis GA CLI - Fit Arrhenius kinetics to TGA data.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;

use pyrolysis_ga::{
    compute::{ArrheniusModel, evolution::Genome},
    runner,
    schema::{ExperimentalDataset, OptimizerConfig},
};

/// Genomes shown from the top of the initial and final populations.
const SHOWN_GENOMES: usize = 10;

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 2 {
        eprintln!("Usage: {} <data.csv> [config.json]", args[0]);
        eprintln!();
        eprintln!("Fit Arrhenius pyrolysis parameters [A, E, NS, yinf] to TGA data.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  data.csv     Samples with columns time,temperature,mass_fraction");
        eprintln!("  config.json  Optimizer configuration (default: built-in)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    let data_path = PathBuf::from(&args[1]);

    // Load configuration
    let config: OptimizerConfig = match args.get(2) {
        Some(path) => {
            let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config file: {}", e);
                std::process::exit(1);
            });
            serde_json::from_str(&config_str).unwrap_or_else(|e| {
                eprintln!("Error parsing config: {}", e);
                std::process::exit(1);
            })
        }
        None => OptimizerConfig::default(),
    };

    let dataset = ExperimentalDataset::from_csv_path(&data_path).unwrap_or_else(|e| {
        eprintln!("Error loading data: {}", e);
        std::process::exit(1);
    });

    println!("Pyrolysis GA");
    println!("============");
    println!("Data: {} ({} samples)", data_path.display(), dataset.len());
    println!(
        "Population: {}, generations: {}, seed: {}",
        config.population.size, config.population.max_generations, config.random_seed
    );
    println!();

    let summary = runner::run(&config, &dataset, ArrheniusModel::default()).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    print_population("Initial population", &summary.initial_population);
    print_population("Final population", &summary.result.population);

    let stats = &summary.result.stats;
    let best = summary.result.best.params();
    println!("Best member:");
    println!("  {}", summary.result.best);
    println!(
        "  A: {:e}, E: {:e}, NS: {}, yinf: {}",
        best.a, best.e, best.ns, best.yinf
    );
    println!();
    println!(
        "Time: {:.2}s ({} generations, {} evaluations)",
        stats.elapsed_seconds, stats.generations, stats.total_evaluations
    );
    println!("Statistics: {}", summary.stats_path.display());
    println!("Results: {}", summary.results_path.display());
}

fn print_population(title: &str, population: &[Genome]) {
    println!(
        "{} (top {} of {}):",
        title,
        SHOWN_GENOMES.min(population.len()),
        population.len()
    );
    for genome in population.iter().take(SHOWN_GENOMES) {
        println!("  {}", genome);
    }
    println!();
}

fn print_example_config() {
    let config = OptimizerConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
