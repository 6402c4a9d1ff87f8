//! Pyrolysis GA - Evolutionary fitting of Arrhenius pyrolysis kinetics.
//!
//! This crate estimates the four parameters of a single-step decomposition
//! model (pre-exponential factor `A`, activation energy `E`, reaction order
//! `NS` and residual mass fraction `yinf`) from thermogravimetric (TGA)
//! measurements, using a real-coded evolutionary algorithm.
//!
//! # Architecture
//!
//! - `schema`: Configuration and experimental data types
//! - `compute`: Forward model and evolutionary search
//! - `runner`: A complete run with statistics and result artifacts
//!
//! # Example
//!
//! ```rust,no_run
//! use pyrolysis_ga::{
//!     compute::ArrheniusModel,
//!     runner,
//!     schema::{ExperimentalDataset, OptimizerConfig},
//! };
//!
//! let dataset = ExperimentalDataset::from_csv_path("tga.csv")?;
//! let config = OptimizerConfig::default();
//!
//! let summary = runner::run(&config, &dataset, ArrheniusModel::default())?;
//! println!("Best: {}", summary.result.best);
//! println!("Results written to {}", summary.results_path.display());
//! # Ok::<(), pyrolysis_ga::OptimizerError>(())
//! ```

pub mod compute;
pub mod error;
pub mod runner;
pub mod schema;

// Re-export commonly used types
pub use compute::ArrheniusModel;
pub use compute::evolution::{EvolutionEngine, EvolutionResult, Genome};
pub use error::OptimizerError;
pub use schema::{ExperimentalDataset, KineticParams, OptimizerConfig};
