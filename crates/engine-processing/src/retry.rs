use connectors::error::DbError;
use engine_core::retry::RetryDisposition;

/// Database errors are retried while they look transient; decode failures
/// stop immediately since the same row will fail the same way again.
pub fn classify_db_error(err: &DbError) -> RetryDisposition {
    if err.is_transient() {
        RetryDisposition::Retry
    } else {
        RetryDisposition::Stop
    }
}
