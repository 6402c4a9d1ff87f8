//! Crate-level error type.

use std::io;
use std::path::Path;

use crate::schema::{ConfigError, DatasetError};

/// Errors that abort an optimization run.
#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    #[error("Configuration validation failed: {0}")]
    Config(#[from] ConfigError),
    #[error("Experimental data rejected: {0}")]
    Dataset(#[from] DatasetError),
    #[error("Unable to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Population is empty after evolution")]
    EmptyPopulation,
}

impl OptimizerError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
