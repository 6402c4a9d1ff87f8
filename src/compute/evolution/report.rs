//! Run statistics, progress reporting and output artifacts.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::OptimizerError;
use crate::schema::{ExperimentalDataset, KineticParams};

use super::fitness::DIVERGED_FITNESS;
use super::genome::Genome;

/// Fitness aggregates for one generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Completed generations (0 = initial population).
    pub generation: usize,
    /// Best fitness in the population.
    pub best: f64,
    /// Mean fitness.
    pub mean: f64,
    /// Sample standard deviation of fitness.
    pub std_dev: f64,
}

impl GenerationStats {
    /// Aggregate the evaluated genomes of a population.
    pub fn from_population(generation: usize, population: &[Genome]) -> Self {
        let values: Vec<f64> = population
            .iter()
            .filter_map(Genome::fitness_value)
            .collect();

        if values.is_empty() {
            return Self {
                generation,
                best: DIVERGED_FITNESS,
                mean: DIVERGED_FITNESS,
                std_dev: 0.0,
            };
        }

        let n = values.len() as f64;
        let best = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = if values.len() < 2 {
            0.0
        } else {
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            variance.sqrt()
        };

        Self {
            generation,
            best,
            mean,
            std_dev,
        }
    }
}

impl fmt::Display for GenerationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Gen. {} Best: {} Mean: {} StdDev: {}",
            self.generation, self.best, self.mean, self.std_dev
        )
    }
}

/// Whitespace-separated per-generation statistics table.
///
/// Opened before the first generation so an unwritable path fails the run
/// before any work is done.
pub struct StatsLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl StatsLog {
    /// Create (truncate) the statistics file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, OptimizerError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| OptimizerError::io(&path, e))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Append one `generation best mean std_dev` row.
    pub fn append(&mut self, stats: &GenerationStats) -> Result<(), OptimizerError> {
        writeln!(
            self.writer,
            "{} {} {} {}",
            stats.generation, stats.best, stats.mean, stats.std_dev
        )
        .map_err(|e| OptimizerError::io(&self.path, e))
    }

    /// Flush buffered rows and close the file.
    pub fn finish(mut self) -> Result<PathBuf, OptimizerError> {
        self.writer
            .flush()
            .map_err(|e| OptimizerError::io(&self.path, e))?;
        Ok(self.path)
    }
}

/// Logs progress at most once per interval of wall-clock time.
#[derive(Debug)]
pub struct TimedMonitor {
    interval: Duration,
    last: Option<Instant>,
}

impl TimedMonitor {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Whether a line would be emitted at `now`. The first call is always due.
    pub fn is_due(&self, now: Instant) -> bool {
        self.last
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Emit `stats` if due at `now`. Returns whether a line was emitted.
    pub fn observe_at(&mut self, stats: &GenerationStats, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        log::info!("{stats}");
        self.last = Some(now);
        true
    }

    pub fn observe(&mut self, stats: &GenerationStats) -> bool {
        self.observe_at(stats, Instant::now())
    }
}

/// Write the results table: a summary line, a header and one row per sample.
pub fn write_results<W: Write>(
    mut writer: W,
    fitness: f64,
    params: &KineticParams,
    dataset: &ExperimentalDataset,
    trajectory: &[f64],
) -> io::Result<()> {
    writeln!(
        writer,
        "Fitness:{}, A:{}, E:{}, NS:{}, yinf:{}",
        fitness, params.a, params.e, params.ns, params.yinf
    )?;
    writeln!(writer, "Time,Temp,Exp,Model")?;
    for (record, simulated) in dataset.iter().zip(trajectory) {
        writeln!(
            writer,
            "{},{},{},{}",
            record.time, record.temperature, record.mass_fraction, simulated
        )?;
    }
    writer.flush()
}

/// Results artifact staged next to its final path.
///
/// The staging file is created up front and renamed into place on
/// [`commit`](Self::commit); if the run fails first it is removed, so a
/// partially written results file never appears at the final path.
pub struct ResultsWriter {
    path: PathBuf,
    staging: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl ResultsWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, OptimizerError> {
        let path = path.as_ref().to_path_buf();
        let mut name = path
            .file_name()
            .ok_or_else(|| {
                OptimizerError::io(
                    &path,
                    io::Error::new(io::ErrorKind::InvalidInput, "Path has no file name"),
                )
            })?
            .to_os_string();
        name.push(".partial");
        let staging = path.with_file_name(name);

        let file = File::create(&staging).map_err(|e| OptimizerError::io(&staging, e))?;

        Ok(Self {
            path,
            staging,
            file: Some(file),
            committed: false,
        })
    }

    /// Write the best genome and its trajectory, then move the file into place.
    pub fn commit(
        mut self,
        best: &Genome,
        dataset: &ExperimentalDataset,
        trajectory: &[f64],
    ) -> Result<PathBuf, OptimizerError> {
        let fitness = best.fitness_value().unwrap_or(DIVERGED_FITNESS);
        if let Some(file) = self.file.take() {
            write_results(
                BufWriter::new(file),
                fitness,
                &best.params(),
                dataset,
                trajectory,
            )
            .map_err(|e| OptimizerError::io(&self.staging, e))?;
        }

        fs::rename(&self.staging, &self.path).map_err(|e| OptimizerError::io(&self.path, e))?;
        self.committed = true;
        Ok(self.path.clone())
    }
}

impl Drop for ResultsWriter {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.staging);
        }
    }
}
