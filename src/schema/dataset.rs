//! Experimental thermogravimetric data.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// One thermogravimetric sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperimentalRecord {
    /// Time since the start of the experiment (s).
    pub time: f64,
    /// Sample temperature (K).
    pub temperature: f64,
    /// Remaining mass relative to the initial mass.
    pub mass_fraction: f64,
}

impl ExperimentalRecord {
    pub fn new(time: f64, temperature: f64, mass_fraction: f64) -> Self {
        Self {
            time,
            temperature,
            mass_fraction,
        }
    }
}

/// Ordered, non-empty sequence of experimental samples.
///
/// Immutable once built; the length fixes the length of every simulated
/// trajectory compared against it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentalDataset {
    records: Vec<ExperimentalRecord>,
}

impl ExperimentalDataset {
    /// Build a dataset, rejecting empty input, non-finite values and
    /// time that does not strictly increase.
    pub fn new(records: Vec<ExperimentalRecord>) -> Result<Self, DatasetError> {
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }

        for (row, record) in records.iter().enumerate() {
            if !(record.time.is_finite()
                && record.temperature.is_finite()
                && record.mass_fraction.is_finite())
            {
                return Err(DatasetError::NonFinite { row });
            }
        }

        if let Some(row) = records
            .windows(2)
            .position(|pair| pair[1].time <= pair[0].time)
        {
            return Err(DatasetError::NonIncreasingTime { row: row + 1 });
        }

        Ok(Self { records })
    }

    /// Read CSV with a `time,temperature,mass_fraction` header.
    ///
    /// Lines starting with `#` are skipped and fields are trimmed.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(reader);

        let records = reader
            .deserialize()
            .collect::<Result<Vec<ExperimentalRecord>, _>>()?;

        Self::new(records)
    }

    /// Read a CSV file (see [`from_csv_reader`](Self::from_csv_reader)).
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path.as_ref()).map_err(|source| DatasetError::Io {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        Self::from_csv_reader(file)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false for a constructed dataset.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn records(&self) -> &[ExperimentalRecord] {
        &self.records
    }

    #[inline]
    pub fn first(&self) -> &ExperimentalRecord {
        &self.records[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExperimentalRecord> {
        self.records.iter()
    }
}

/// Dataset loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Experimental dataset is empty")]
    Empty,
    #[error("Row {row} contains a non-finite value")]
    NonFinite { row: usize },
    #[error("Time at row {row} does not increase")]
    NonIncreasingTime { row: usize },
    #[error("Failed to open {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}
