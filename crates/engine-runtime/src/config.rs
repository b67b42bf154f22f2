use engine_processing::executor::ExecutionMode;
use std::path::PathBuf;
use thiserror::Error;

/// Default read window, sized for a multi-hundred-million-row table.
/// Decrease when the machine becomes the bottleneck.
pub const DEFAULT_BATCH_SIZE: usize = 500_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Batch size must be positive")]
    InvalidBatchSize,

    #[error("Worker count must be positive")]
    InvalidWorkers,

    #[error("Source table name is empty")]
    EmptyTable,

    #[error("Failure report path is not writable: {0}")]
    OutputNotWritable(String),
}

/// Configuration surface of one pipeline run. Values come from the caller
/// (CLI flags in the binary); parsing is not this crate's concern.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Source table holding the raw addresses.
    pub table: String,
    pub batch_size: usize,
    /// Fan records of a batch out across workers instead of processing them
    /// in order. Works well on a fast machine, will bury a slow one.
    pub parallel: bool,
    /// Worker pool size in parallel mode.
    pub workers: usize,
    /// Failure report destination; failures are only counted when unset.
    pub output_file: Option<PathBuf>,
    /// Continue from the last committed checkpoint instead of the start.
    pub resume: bool,
}

impl RunConfig {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            parallel: false,
            workers: default_workers(),
            output_file: None,
            resume: false,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_output_file(mut self, path: Option<PathBuf>) -> Self {
        self.output_file = path;
        self
    }

    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table.trim().is_empty() {
            return Err(ConfigError::EmptyTable);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        Ok(())
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        if self.parallel {
            ExecutionMode::Parallel {
                workers: self.workers,
            }
        } else {
            ExecutionMode::Sequential
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RunConfig::new("raw_addresses");
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.execution_mode(), ExecutionMode::Sequential);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let config = RunConfig::new("raw_addresses").with_batch_size(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBatchSize)
        ));
    }

    #[test]
    fn empty_table_is_rejected() {
        assert!(matches!(
            RunConfig::new("  ").validate(),
            Err(ConfigError::EmptyTable)
        ));
    }

    #[test]
    fn parallel_mode_carries_the_worker_count() {
        let config = RunConfig::new("raw_addresses")
            .with_parallel(true)
            .with_workers(8);
        assert_eq!(
            config.execution_mode(),
            ExecutionMode::Parallel { workers: 8 }
        );
    }
}
