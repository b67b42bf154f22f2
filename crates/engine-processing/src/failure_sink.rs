use crate::error::SinkError;
use model::records::failure::FailureRecord;
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Summary returned by `finalize`.
#[derive(Debug, Clone)]
pub struct FailureReportSummary {
    pub recorded: u64,
    /// `None` when no output destination was configured (counts only).
    pub report_path: Option<PathBuf>,
}

/// Collects failed record keys for the run.
///
/// With an output path configured, failures are streamed to a csv file
/// (`key,reason` rows, truncated per run) and flushed per batch, so an
/// aborted run keeps the rows recorded up to the last flush. Without a
/// path, failures are only counted.
pub struct FailureSink {
    writer: Option<csv::Writer<File>>,
    report_path: Option<PathBuf>,
    recorded: u64,
}

impl FailureSink {
    /// Opens the sink, creating parent directories and truncating any
    /// previous report. Failing here is a configuration error and happens
    /// before the first batch is read.
    pub fn open(output: Option<&Path>) -> Result<Self, SinkError> {
        let (writer, report_path) = match output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                let file = File::create(path)?;
                let writer = csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_writer(file);
                info!(path = %path.display(), "Failure report opened");
                (Some(writer), Some(path.to_path_buf()))
            }
            None => {
                debug!("No failure report configured, counting only");
                (None, None)
            }
        };

        Ok(Self {
            writer,
            report_path,
            recorded: 0,
        })
    }

    pub fn record(&mut self, failure: &FailureRecord) -> Result<(), SinkError> {
        if let Some(writer) = &mut self.writer {
            writer.write_record([failure.key.to_string(), failure.report_reason()])?;
        }
        self.recorded += 1;
        Ok(())
    }

    /// Pushes buffered rows to disk. Called once per batch so the loss
    /// window on a hard abort is at most one batch of failures.
    pub fn flush(&mut self) -> Result<(), SinkError> {
        if let Some(writer) = &mut self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    pub fn finalize(mut self) -> Result<FailureReportSummary, SinkError> {
        self.flush()?;
        if let Some(path) = &self.report_path {
            info!(
                path = %path.display(),
                failures = self.recorded,
                "Failure report finalized"
            );
        }
        Ok(FailureReportSummary {
            recorded: self.recorded,
            report_path: self.report_path.clone(),
        })
    }
}
