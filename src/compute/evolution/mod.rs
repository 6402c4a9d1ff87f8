//! Evolutionary search for kinetic parameters that reproduce a TGA curve.
//!
//! # Overview
//!
//! The evolutionary search system consists of:
//!
//! - **Genomes** (`genome`): the four genes `[A, E, NS, yinf]`, cached fitness,
//!   the seeded random source and the gene-level variation primitives
//! - **Fitness** (`fitness`): negative sum of squared residuals against the
//!   experimental curve, with a sentinel for diverged simulations
//! - **Operators** (`operators`): weighted crossover and mutation combinations
//!   and the variation pipeline applied to selected parents
//! - **Search** (`search`): stochastic tournament selection, elitist plus
//!   replacement and the generational loop
//! - **Reporting** (`report`): per-generation statistics, timed progress and
//!   the output artifacts
//!
//! # Example
//!
//! ```rust,no_run
//! use pyrolysis_ga::compute::ArrheniusModel;
//! use pyrolysis_ga::compute::evolution::EvolutionEngine;
//! use pyrolysis_ga::schema::{ExperimentalDataset, OptimizerConfig};
//!
//! let dataset = ExperimentalDataset::from_csv_path("tga.csv").unwrap();
//! let config = OptimizerConfig::default();
//!
//! let mut engine = EvolutionEngine::new(config, ArrheniusModel::default(), &dataset).unwrap();
//! let result = engine.run_with_callback(|stats| {
//!     println!("Generation {}: best fitness = {:.3e}", stats.generation, stats.best);
//! });
//!
//! println!("Best genome: {}", result.best);
//! ```
//!
//! # Variation operators
//!
//! - `Segment`: per-gene blend along the segment through both parents
//! - `Hypercube`: independent draws from the parents' box, widened by `alpha`
//! - `Uniform`: every gene shifted within `±epsilon·|gene|`
//! - `DetUniform`: one random gene shifted within `±epsilon·|gene|`
//! - `Normal`: every gene perturbed by `N(0, (sigma·|gene|)²)`

mod fitness;
mod genome;
mod operators;
mod report;
mod search;

pub use fitness::*;
pub use genome::*;
pub use operators::*;
pub use report::*;
pub use search::*;
