use crate::{
    error::ExecutorError,
    normalize::{AddressNormalizer, NormalizeOutcome},
    retry::classify_db_error,
};
use connectors::destination::AddressDestination;
use engine_core::retry::RetryPolicy;
use futures::{StreamExt, stream};
use model::records::{address::NormalizedAddress, batch::Batch, failure::FailureRecord};
use std::{sync::Arc, time::Instant};
use tracing::{debug, info};

/// How records inside a batch are dispatched to normalization workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Strict batch order, one record at a time.
    Sequential,
    /// Bounded fan-out across blocking workers. Completion order is not
    /// guaranteed; results are re-keyed afterwards.
    Parallel { workers: usize },
}

/// Everything one batch produced. Successes and failures are sorted by
/// source key, so parallel and sequential execution are indistinguishable
/// to consumers.
#[derive(Debug)]
pub struct BatchOutcome {
    pub batch_id: String,
    pub successes: Vec<NormalizedAddress>,
    pub failures: Vec<FailureRecord>,
    pub duration: std::time::Duration,
}

/// Drives one batch through the normalizer pool and commits the normalized
/// rows as a single transaction. Failures never abort the batch; they are
/// handed back for the failure sink. A commit failure after retries does
/// abort, leaving nothing of the batch behind.
pub struct BatchExecutor {
    normalizer: Arc<dyn AddressNormalizer>,
    destination: Arc<dyn AddressDestination>,
    retry: RetryPolicy,
    mode: ExecutionMode,
}

impl BatchExecutor {
    pub fn new(
        normalizer: Arc<dyn AddressNormalizer>,
        destination: Arc<dyn AddressDestination>,
        retry: RetryPolicy,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            normalizer,
            destination,
            retry,
            mode,
        }
    }

    pub async fn execute(&self, batch: &Batch) -> Result<BatchOutcome, ExecutorError> {
        let start = Instant::now();
        debug!(
            batch_id = %batch.id,
            records = batch.len(),
            mode = ?self.mode,
            "Executing batch"
        );

        let outcomes = match self.mode {
            ExecutionMode::Sequential => self.normalize_sequential(batch)?,
            ExecutionMode::Parallel { workers } => {
                self.normalize_parallel(batch, workers.max(1)).await?
            }
        };

        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                NormalizeOutcome::Normalized(addr) => successes.push(addr),
                NormalizeOutcome::Failed(failure) => failures.push(failure),
            }
        }

        // Re-key after fan-in: ordering loss from parallel completion must be
        // invisible downstream.
        successes.sort_by_key(|a| a.key);
        failures.sort_by_key(|f| f.key);

        self.commit(batch, &successes).await?;

        let duration = start.elapsed();
        info!(
            batch_id = %batch.id,
            succeeded = successes.len(),
            failed = failures.len(),
            duration_ms = duration.as_millis(),
            "Batch executed"
        );

        Ok(BatchOutcome {
            batch_id: batch.id.clone(),
            successes,
            failures,
            duration,
        })
    }

    fn normalize_sequential(&self, batch: &Batch) -> Result<Vec<NormalizeOutcome>, ExecutorError> {
        let mut outcomes = Vec::with_capacity(batch.len());
        for record in &batch.records {
            outcomes.push(self.normalizer.normalize(record)?);
        }
        Ok(outcomes)
    }

    async fn normalize_parallel(
        &self,
        batch: &Batch,
        workers: usize,
    ) -> Result<Vec<NormalizeOutcome>, ExecutorError> {
        // Normalization is CPU-bound, so each record runs on the blocking
        // pool; `buffer_unordered` bounds how many are in flight at once.
        let joined: Vec<_> = stream::iter(batch.records.iter().cloned())
            .map(|record| {
                let normalizer = self.normalizer.clone();
                tokio::task::spawn_blocking(move || normalizer.normalize(&record))
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        let mut outcomes = Vec::with_capacity(joined.len());
        for result in joined {
            outcomes.push(result??);
        }
        Ok(outcomes)
    }

    async fn commit(
        &self,
        batch: &Batch,
        successes: &[NormalizedAddress],
    ) -> Result<(), ExecutorError> {
        self.retry
            .run(
                || async { self.destination.write_batch(&batch.id, successes).await },
                classify_db_error,
            )
            .await
            .map_err(|e| ExecutorError::Commit {
                batch_id: batch.id.clone(),
                source: e.into_inner(),
            })
    }
}
