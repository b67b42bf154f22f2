use crate::{
    config::RunConfig,
    runner::{PipelineParams, PipelineRunner, RunReport, RunState},
};
use connectors::memory::{MemoryAddressDestination, MemoryAddressSource};
use engine_core::{retry::RetryPolicy, state::sled_store::SledStateStore};
use engine_processing::normalize::{AddressNormalizer, NormalizeError, NormalizeOutcome};
use model::{
    pagination::cursor::Cursor,
    records::{
        address::{MatchQuality, NormalizedAddress, RawAddressRecord},
        failure::{FailureRecord, FailureReason},
    },
};
use std::{collections::HashSet, path::PathBuf, sync::Arc};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn rows(n: i64) -> Vec<RawAddressRecord> {
    (1..=n)
        .map(|k| RawAddressRecord::new(k, format!("{k} Main St")))
        .collect()
}

/// Deterministic normalizer: the listed keys fail, everything else succeeds.
struct FailingKeys(HashSet<i64>);

impl FailingKeys {
    fn new(keys: &[i64]) -> Arc<Self> {
        Arc::new(Self(keys.iter().copied().collect()))
    }
}

impl AddressNormalizer for FailingKeys {
    fn normalize(&self, record: &RawAddressRecord) -> Result<NormalizeOutcome, NormalizeError> {
        if self.0.contains(&record.key) {
            return Ok(NormalizeOutcome::Failed(FailureRecord::new(
                record.key,
                FailureReason::Unparseable,
                "scripted",
            )));
        }
        Ok(NormalizeOutcome::Normalized(NormalizedAddress {
            key: record.key,
            street: record.line_one.to_uppercase(),
            unit: None,
            city: "SPRINGFIELD".into(),
            region: "IL".into(),
            postal_code: "62701".into(),
            country: "US".into(),
            latitude: None,
            longitude: None,
            match_quality: MatchQuality::Verified,
        }))
    }
}

struct Harness {
    source: Arc<MemoryAddressSource>,
    destination: Arc<MemoryAddressDestination>,
    state: Arc<SledStateStore>,
    normalizer: Arc<FailingKeys>,
    cancel: CancellationToken,
    // Keeps the sled directory alive for the test's duration.
    _dir: TempDir,
}

impl Harness {
    fn new(table_rows: Vec<RawAddressRecord>, failing_keys: &[i64]) -> Self {
        let dir = TempDir::new().unwrap();
        Self {
            source: Arc::new(MemoryAddressSource::new(table_rows)),
            destination: Arc::new(MemoryAddressDestination::new()),
            state: Arc::new(SledStateStore::open(dir.path().join("state")).unwrap()),
            normalizer: FailingKeys::new(failing_keys),
            cancel: CancellationToken::new(),
            _dir: dir,
        }
    }

    fn runner(&self, config: RunConfig) -> PipelineRunner {
        PipelineRunner::new(PipelineParams {
            source: self.source.clone(),
            normalizer: self.normalizer.clone(),
            destination: self.destination.clone(),
            state: self.state.clone(),
            config,
            cancel: self.cancel.clone(),
            retry: RetryPolicy::none(),
        })
    }

    async fn run(&self, config: RunConfig) -> RunReport {
        self.runner(config).run().await.unwrap()
    }

    fn written_keys(&self) -> Vec<i64> {
        self.destination.written().iter().map(|a| a.key).collect()
    }

    fn report_path(&self) -> PathBuf {
        self._dir.path().join("failed_keys.csv")
    }
}

#[tokio::test]
async fn full_run_splits_successes_and_failures_across_batches() {
    let harness = Harness::new(rows(10), &[4, 9]);
    let config = RunConfig::new("raw_addresses")
        .with_batch_size(3)
        .with_output_file(Some(harness.report_path()));

    let report = harness.run(config).await;

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.totals.total_processed, 10);
    assert_eq!(report.totals.total_succeeded, 8);
    assert_eq!(report.totals.total_failed, 2);
    assert_eq!(report.resume_cursor, Cursor::after(10));
    assert!(report.error.is_none());

    assert_eq!(harness.written_keys(), vec![1, 2, 3, 5, 6, 7, 8, 10]);
    assert_eq!(harness.destination.committed_batches(), 4);

    let contents = std::fs::read_to_string(harness.report_path()).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("4,"));
    assert!(lines[1].starts_with("9,"));
}

#[tokio::test]
async fn batch_size_one_and_oversized_batch_agree() {
    let small = Harness::new(rows(7), &[2]);
    let small_report = small
        .run(RunConfig::new("raw_addresses").with_batch_size(1))
        .await;

    let large = Harness::new(rows(7), &[2]);
    let large_report = large
        .run(RunConfig::new("raw_addresses").with_batch_size(100))
        .await;

    assert_eq!(small_report.state, RunState::Completed);
    assert_eq!(large_report.state, RunState::Completed);
    assert_eq!(small_report.totals, large_report.totals);
    assert_eq!(small.written_keys(), large.written_keys());
    // One commit per row versus one commit for the whole table.
    assert_eq!(small.destination.committed_batches(), 7);
    assert_eq!(large.destination.committed_batches(), 1);
}

#[tokio::test]
async fn parallel_run_matches_sequential_output() {
    let sequential = Harness::new(rows(30), &[5, 18, 27]);
    let seq_report = sequential
        .run(RunConfig::new("raw_addresses").with_batch_size(8))
        .await;

    let parallel = Harness::new(rows(30), &[5, 18, 27]);
    let par_report = parallel
        .run(
            RunConfig::new("raw_addresses")
                .with_batch_size(8)
                .with_parallel(true)
                .with_workers(4),
        )
        .await;

    assert_eq!(seq_report.totals, par_report.totals);
    assert_eq!(sequential.written_keys(), parallel.written_keys());
    assert_eq!(sequential.destination.written(), parallel.destination.written());
}

#[tokio::test]
async fn empty_table_completes_with_zero_totals() {
    let harness = Harness::new(Vec::new(), &[]);
    let report = harness.run(RunConfig::new("raw_addresses")).await;

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.totals.total_processed, 0);
    assert_eq!(report.resume_cursor, Cursor::None);
    assert_eq!(harness.destination.committed_batches(), 0);
}

#[tokio::test]
async fn unavailable_source_aborts_before_anything_is_processed() {
    let harness = Harness::new(rows(5), &[]);
    harness.source.fail_next_fetches(10);

    let report = harness
        .run(RunConfig::new("raw_addresses").with_output_file(Some(harness.report_path())))
        .await;

    assert_eq!(report.state, RunState::Aborted);
    assert_eq!(report.error_category.as_deref(), Some("source_unavailable"));
    assert_eq!(report.totals.total_processed, 0);
    assert_eq!(report.resume_cursor, Cursor::None);
    assert!(harness.written_keys().is_empty());

    // The report was opened at startup but nothing reached it.
    assert_eq!(report.failure_report, Some(harness.report_path()));
    assert_eq!(std::fs::read_to_string(harness.report_path()).unwrap(), "");
}

#[tokio::test]
async fn commit_failure_aborts_at_the_last_committed_cursor() {
    let mut harness = Harness::new(rows(10), &[4]);
    // Batches 0 and 1 commit, the third one cannot.
    harness.destination = Arc::new(MemoryAddressDestination::failing_on_batch(2));

    let report = harness
        .run(
            RunConfig::new("raw_addresses")
                .with_batch_size(3)
                .with_output_file(Some(harness.report_path())),
        )
        .await;

    assert_eq!(report.state, RunState::Aborted);
    assert_eq!(report.error_category.as_deref(), Some("persistence"));
    assert_eq!(report.totals.total_processed, 6);
    assert_eq!(report.totals.total_succeeded, 5);
    assert_eq!(report.totals.total_failed, 1);
    assert_eq!(report.resume_cursor, Cursor::after(6));
    assert_eq!(harness.written_keys(), vec![1, 2, 3, 5, 6]);

    // Failures recorded before the abort survive in the report file.
    let contents = std::fs::read_to_string(harness.report_path()).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("4,"));
}

#[tokio::test]
async fn resume_after_commit_failure_finishes_the_table() {
    let mut harness = Harness::new(rows(10), &[4]);
    harness.destination = Arc::new(MemoryAddressDestination::failing_on_batch(2));

    let aborted = harness
        .run(RunConfig::new("raw_addresses").with_batch_size(3))
        .await;
    assert_eq!(aborted.state, RunState::Aborted);

    // The blocking condition clears; the rerun picks up from the checkpoint.
    harness.destination = Arc::new(MemoryAddressDestination::new());
    let resumed = harness
        .run(
            RunConfig::new("raw_addresses")
                .with_batch_size(3)
                .with_resume(true),
        )
        .await;

    assert_eq!(resumed.state, RunState::Completed);
    assert_eq!(resumed.totals.total_processed, 10);
    assert_eq!(resumed.totals.total_succeeded, 9);
    assert_eq!(resumed.totals.total_failed, 1);
    assert_eq!(resumed.resume_cursor, Cursor::after(10));
    // Only the remainder of the table is re-read.
    assert_eq!(harness.written_keys(), vec![7, 8, 9, 10]);
}

#[tokio::test]
async fn resume_without_a_checkpoint_starts_from_the_beginning() {
    let harness = Harness::new(rows(4), &[]);
    let report = harness
        .run(RunConfig::new("raw_addresses").with_resume(true))
        .await;

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.totals.total_processed, 4);
    assert_eq!(harness.written_keys(), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn cancellation_is_observed_between_batches() {
    let harness = Harness::new(rows(5), &[]);
    harness.cancel.cancel();

    let report = harness.run(RunConfig::new("raw_addresses")).await;

    assert_eq!(report.state, RunState::Aborted);
    assert_eq!(report.error_category.as_deref(), Some("cancelled"));
    assert_eq!(report.totals.total_processed, 0);
    assert!(harness.written_keys().is_empty());
}

#[tokio::test]
async fn invalid_configuration_is_rejected_before_the_run() {
    let harness = Harness::new(rows(3), &[]);
    let result = harness
        .runner(RunConfig::new("raw_addresses").with_batch_size(0))
        .run()
        .await;

    assert!(result.is_err());
    assert!(harness.written_keys().is_empty());
}

#[tokio::test]
async fn metrics_track_batch_totals() {
    let harness = Harness::new(rows(6), &[3]);
    let runner = harness.runner(RunConfig::new("raw_addresses").with_batch_size(2));
    let metrics = runner.metrics();

    let report = runner.run().await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.records_processed, 6);
    assert_eq!(snapshot.records_succeeded, 5);
    assert_eq!(snapshot.records_failed, 1);
    assert_eq!(snapshot.batches_committed, 3);
}
