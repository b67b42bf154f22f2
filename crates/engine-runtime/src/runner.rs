use crate::{
    config::{ConfigError, RunConfig},
    error::RunError,
};
use connectors::{destination::AddressDestination, source::AddressSource};
use engine_core::{
    metrics::RunMetrics,
    retry::RetryPolicy,
    state::{
        StateStore,
        models::{Checkpoint, CheckpointStage},
    },
};
use engine_processing::{
    executor::BatchExecutor,
    failure_sink::FailureSink,
    normalize::AddressNormalizer,
    retry::classify_db_error,
};
use model::{
    pagination::{cursor::Cursor, page::FetchResult},
    records::batch::Batch,
};
use serde::Serialize;
use std::{path::PathBuf, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Completed,
    Aborted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub total_processed: u64,
    pub total_succeeded: u64,
    pub total_failed: u64,
}

/// What a run hands back to the caller. On abort, `resume_cursor` is the
/// end of the last committed batch; a rerun with `resume` picks up there.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub table: String,
    pub state: RunState,
    pub totals: RunTotals,
    pub resume_cursor: Cursor,
    pub error_category: Option<String>,
    pub error: Option<String>,
    pub failure_report: Option<PathBuf>,
}

pub struct PipelineParams {
    pub source: Arc<dyn AddressSource>,
    pub normalizer: Arc<dyn AddressNormalizer>,
    pub destination: Arc<dyn AddressDestination>,
    pub state: Arc<dyn StateStore>,
    pub config: RunConfig,
    pub cancel: CancellationToken,
    pub retry: RetryPolicy,
}

/// Orchestrates the whole table: cursor advancement, batch execution,
/// failure routing, checkpointing. A single control task drives the loop;
/// batches never run concurrently with each other, which bounds memory and
/// keeps the cursor/commit pairing trivial to reason about.
pub struct PipelineRunner {
    source: Arc<dyn AddressSource>,
    executor: BatchExecutor,
    state: Arc<dyn StateStore>,
    config: RunConfig,
    cancel: CancellationToken,
    retry: RetryPolicy,
    metrics: RunMetrics,
}

struct RunPosition {
    /// Last committed cursor; only moves after a checkpointed commit.
    cursor: Cursor,
    seq: u64,
}

impl PipelineRunner {
    pub fn new(params: PipelineParams) -> Self {
        let executor = BatchExecutor::new(
            params.normalizer,
            params.destination,
            params.retry.clone(),
            params.config.execution_mode(),
        );

        Self {
            source: params.source,
            executor,
            state: params.state,
            config: params.config,
            cancel: params.cancel,
            retry: params.retry,
            metrics: RunMetrics::new(),
        }
    }

    /// Shared progress counters, safe to read from other tasks.
    pub fn metrics(&self) -> RunMetrics {
        self.metrics.clone()
    }

    pub async fn run(self) -> Result<RunReport, RunError> {
        // Idle -> Running: reject bad configuration before touching the
        // source, including an unwritable report path.
        self.config.validate()?;
        let mut sink = FailureSink::open(self.config.output_file.as_deref())
            .map_err(|e| ConfigError::OutputNotWritable(e.to_string()))?;

        let run_id = format!("run-{}", Uuid::new_v4().simple());
        let (start_cursor, mut totals) = self.starting_position().await?;

        info!(
            run_id = %run_id,
            table = %self.config.table,
            batch_size = self.config.batch_size,
            parallel = self.config.parallel,
            cursor = %start_cursor,
            "Pipeline run starting"
        );

        let mut position = RunPosition {
            cursor: start_cursor,
            seq: 0,
        };

        let result = self
            .run_loop(&run_id, &mut position, &mut totals, &mut sink)
            .await;

        match result {
            Ok(()) => {
                let summary = sink.finalize()?;
                info!(
                    run_id = %run_id,
                    processed = totals.total_processed,
                    succeeded = totals.total_succeeded,
                    failed = totals.total_failed,
                    "Pipeline run completed"
                );
                Ok(RunReport {
                    run_id,
                    table: self.config.table.clone(),
                    state: RunState::Completed,
                    totals,
                    resume_cursor: position.cursor,
                    error_category: None,
                    error: None,
                    failure_report: summary.report_path,
                })
            }
            Err(err) => {
                error!(
                    run_id = %run_id,
                    category = err.category(),
                    error = %err,
                    resume_cursor = %position.cursor,
                    "Pipeline run aborted"
                );

                // Best effort: failures recorded so far should still reach
                // the report even when the run dies.
                let failure_report = match sink.finalize() {
                    Ok(summary) => summary.report_path,
                    Err(sink_err) => {
                        warn!(error = %sink_err, "Could not finalize failure report during abort");
                        None
                    }
                };

                Ok(RunReport {
                    run_id,
                    table: self.config.table.clone(),
                    state: RunState::Aborted,
                    totals,
                    resume_cursor: position.cursor,
                    error_category: Some(err.category().to_string()),
                    error: Some(err.to_string()),
                    failure_report,
                })
            }
        }
    }

    async fn run_loop(
        &self,
        run_id: &str,
        position: &mut RunPosition,
        totals: &mut RunTotals,
        sink: &mut FailureSink,
    ) -> Result<(), RunError> {
        loop {
            // Cancellation is observed between batches only; an in-flight
            // batch always finishes and commits first.
            if self.cancel.is_cancelled() {
                return Err(RunError::Cancelled);
            }

            let fetch = self.fetch_batch(position.cursor.clone()).await?;
            if fetch.is_empty() {
                return Ok(());
            }

            let reached_end = fetch.reached_end;
            let batch = Batch::new(position.seq, fetch.records, position.cursor.clone());
            position.seq += 1;

            self.save_checkpoint(run_id, &batch, CheckpointStage::Read, batch.cursor.clone(), totals)
                .await?;

            let outcome = self.executor.execute(&batch).await?;

            // Failure reporting sits outside the batch transaction: it is
            // best-effort output, not authoritative state.
            for failure in &outcome.failures {
                sink.record(failure)?;
            }
            sink.flush()?;

            totals.total_processed += batch.len() as u64;
            totals.total_succeeded += outcome.successes.len() as u64;
            totals.total_failed += outcome.failures.len() as u64;
            self.metrics
                .record_batch(outcome.successes.len() as u64, outcome.failures.len() as u64);

            self.save_checkpoint(run_id, &batch, CheckpointStage::Committed, batch.next.clone(), totals)
                .await?;
            position.cursor = batch.next.clone();

            info!(
                batch_id = %outcome.batch_id,
                processed = totals.total_processed,
                succeeded = totals.total_succeeded,
                failed = totals.total_failed,
                "Batch committed"
            );

            if reached_end {
                return Ok(());
            }
        }
    }

    async fn fetch_batch(&self, cursor: Cursor) -> Result<FetchResult, RunError> {
        self.retry
            .run(
                || {
                    let cursor = cursor.clone();
                    async move { self.source.fetch(self.config.batch_size, cursor).await }
                },
                classify_db_error,
            )
            .await
            .map_err(|e| RunError::SourceUnavailable {
                cursor,
                message: e.into_inner().to_string(),
            })
    }

    async fn save_checkpoint(
        &self,
        run_id: &str,
        batch: &Batch,
        stage: CheckpointStage,
        cursor: Cursor,
        totals: &RunTotals,
    ) -> Result<(), RunError> {
        let cp = Checkpoint {
            run_id: run_id.to_string(),
            table: self.config.table.clone(),
            stage,
            cursor,
            batch_id: batch.id.clone(),
            rows_done: totals.total_processed,
            succeeded: totals.total_succeeded,
            failed: totals.total_failed,
            updated_at: chrono::Utc::now(),
        };
        self.state.save_checkpoint(&cp).await?;
        Ok(())
    }

    async fn starting_position(&self) -> Result<(Cursor, RunTotals), RunError> {
        if !self.config.resume {
            return Ok((Cursor::None, RunTotals::default()));
        }

        match self.state.load_checkpoint(&self.config.table).await? {
            Some(cp) => {
                let totals = RunTotals {
                    total_processed: cp.rows_done,
                    total_succeeded: cp.succeeded,
                    total_failed: cp.failed,
                };
                if cp.stage == CheckpointStage::Committed {
                    info!(cursor = %cp.cursor, rows_done = cp.rows_done, "Resuming from committed checkpoint");
                } else {
                    // A Read-stage checkpoint carries the cursor its batch
                    // started from, so the interrupted batch is re-run whole.
                    warn!(cursor = %cp.cursor, batch_id = %cp.batch_id, "Resuming an uncommitted batch from its start");
                }
                Ok((cp.cursor.clone(), totals))
            }
            None => {
                info!("Resume requested but no checkpoint found, starting from the beginning");
                Ok((Cursor::None, RunTotals::default()))
            }
        }
    }
}
