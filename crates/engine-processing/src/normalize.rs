use model::records::{address::NormalizedAddress, address::RawAddressRecord, failure::FailureRecord};
use thiserror::Error;

/// Result of normalizing one record. A record the normalizer cannot make
/// sense of is a `Failed` outcome, not an error; it is reported and the run
/// moves on.
#[derive(Debug, Clone)]
pub enum NormalizeOutcome {
    Normalized(NormalizedAddress),
    Failed(FailureRecord),
}

/// Something went wrong inside the normalizer that is not about the address
/// content (corrupted input encoding, exhausted resources). Fatal: aborts
/// the run.
#[derive(Error, Debug)]
#[error("Normalizer failed on record {key}: {message}")]
pub struct NormalizeError {
    pub key: i64,
    pub message: String,
}

/// The opaque normalization capability.
///
/// Implementations must be pure with respect to pipeline state: no shared
/// mutable state beyond their own computation, so records of one batch can
/// be normalized concurrently without locking.
pub trait AddressNormalizer: Send + Sync {
    fn normalize(&self, record: &RawAddressRecord) -> Result<NormalizeOutcome, NormalizeError>;
}
