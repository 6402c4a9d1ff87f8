//! Schema module - Configuration and experimental data types.

mod config;
mod dataset;

pub use config::*;
pub use dataset::*;
