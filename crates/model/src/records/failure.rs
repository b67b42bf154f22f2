use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a record could not be normalized. These are expected outcomes, not
/// errors: a failed record is reported and the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// The address text could not be parsed into components at all.
    Unparseable,
    /// Parsed, but matched more than one canonical address.
    AmbiguousMatch,
    /// The normalizer gave up on this record within its time budget.
    Timeout,
    /// Required components (city/region/postal code) are absent.
    MissingFields,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Unparseable => "unparseable",
            FailureReason::AmbiguousMatch => "ambiguous_match",
            FailureReason::Timeout => "timeout",
            FailureReason::MissingFields => "missing_fields",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that could not be normalized, kept for the failure report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub key: i64,
    pub reason: FailureReason,
    pub message: String,
    pub failed_at: DateTime<Utc>,
}

impl FailureRecord {
    pub fn new(key: i64, reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            key,
            reason,
            message: message.into(),
            failed_at: Utc::now(),
        }
    }

    /// The reason string written to the report file: category plus detail
    /// when a detail message is present.
    pub fn report_reason(&self) -> String {
        if self.message.is_empty() {
            self.reason.to_string()
        } else {
            format!("{}: {}", self.reason, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_reason_includes_detail() {
        let failure = FailureRecord::new(9, FailureReason::Unparseable, "no street number");
        assert_eq!(failure.report_reason(), "unparseable: no street number");
    }

    #[test]
    fn report_reason_without_detail_is_the_category() {
        let failure = FailureRecord::new(9, FailureReason::Timeout, "");
        assert_eq!(failure.report_reason(), "timeout");
    }
}
