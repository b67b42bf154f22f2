use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    records_processed: AtomicU64,
    records_succeeded: AtomicU64,
    records_failed: AtomicU64,
    batches_committed: AtomicU64,
}

/// Cheap shared counters for run progress. Only the orchestrating loop
/// increments them; other readers (progress logging, shutdown summaries)
/// take snapshots.
#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub records_processed: u64,
    pub records_succeeded: u64,
    pub records_failed: u64,
    pub batches_committed: u64,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_batch(&self, succeeded: u64, failed: u64) {
        self.inner
            .records_processed
            .fetch_add(succeeded + failed, Ordering::Relaxed);
        self.inner
            .records_succeeded
            .fetch_add(succeeded, Ordering::Relaxed);
        self.inner.records_failed.fetch_add(failed, Ordering::Relaxed);
        self.inner.batches_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_processed: self.inner.records_processed.load(Ordering::Relaxed),
            records_succeeded: self.inner.records_succeeded.load(Ordering::Relaxed),
            records_failed: self.inner.records_failed.load(Ordering::Relaxed),
            batches_committed: self.inner.batches_committed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_recording_accumulates() {
        let metrics = RunMetrics::new();
        metrics.record_batch(8, 2);
        metrics.record_batch(5, 0);

        let snap = metrics.snapshot();
        assert_eq!(snap.records_processed, 15);
        assert_eq!(snap.records_succeeded, 13);
        assert_eq!(snap.records_failed, 2);
        assert_eq!(snap.batches_committed, 2);
    }
}
