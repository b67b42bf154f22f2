//! Minimal rule-based normalizer so the binary is usable end to end without
//! an external matching service. Deliberately conservative: anything it is
//! unsure about becomes a failure record rather than a low-quality guess.

use crate::normalize::{AddressNormalizer, NormalizeError, NormalizeOutcome};
use model::records::{
    address::{MatchQuality, NormalizedAddress, RawAddressRecord},
    failure::{FailureRecord, FailureReason},
};

#[derive(Debug, Default)]
pub struct HeuristicNormalizer;

impl HeuristicNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn collapse_ws(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn valid_postal_code(code: &str) -> bool {
        let digits = code.trim();
        digits.len() == 5 && digits.bytes().all(|b| b.is_ascii_digit())
    }
}

impl AddressNormalizer for HeuristicNormalizer {
    fn normalize(&self, record: &RawAddressRecord) -> Result<NormalizeOutcome, NormalizeError> {
        let street = Self::collapse_ws(&record.line_one).to_uppercase();
        if street.is_empty() {
            return Ok(NormalizeOutcome::Failed(FailureRecord::new(
                record.key,
                FailureReason::Unparseable,
                "empty street line",
            )));
        }

        let (city, region, postal_code) = match (&record.city, &record.region, &record.postal_code)
        {
            (Some(city), Some(region), Some(postal)) => (
                Self::collapse_ws(city).to_uppercase(),
                Self::collapse_ws(region).to_uppercase(),
                postal.trim().to_string(),
            ),
            _ => {
                return Ok(NormalizeOutcome::Failed(FailureRecord::new(
                    record.key,
                    FailureReason::MissingFields,
                    "city, region and postal code are required",
                )));
            }
        };

        if !Self::valid_postal_code(&postal_code) {
            return Ok(NormalizeOutcome::Failed(FailureRecord::new(
                record.key,
                FailureReason::Unparseable,
                format!("postal code '{postal_code}'"),
            )));
        }

        // A leading house number is the difference between a street-level
        // match and a best-effort one.
        let match_quality = if street
            .split(' ')
            .next()
            .is_some_and(|w| w.bytes().all(|b| b.is_ascii_digit()))
        {
            MatchQuality::Approximate
        } else {
            MatchQuality::PostalOnly
        };

        let unit = record
            .line_two
            .as_deref()
            .map(Self::collapse_ws)
            .filter(|u| !u.is_empty())
            .map(|u| u.to_uppercase());

        Ok(NormalizeOutcome::Normalized(NormalizedAddress {
            key: record.key,
            street,
            unit,
            city,
            region,
            postal_code,
            country: "US".to_string(),
            latitude: None,
            longitude: None,
            match_quality,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_record(key: i64) -> RawAddressRecord {
        RawAddressRecord::new(key, "  123   Main  St ")
            .with_city("Springfield")
            .with_region("il")
            .with_postal_code("62701")
    }

    #[test]
    fn normalizes_a_complete_record() {
        let outcome = HeuristicNormalizer::new().normalize(&full_record(1)).unwrap();
        match outcome {
            NormalizeOutcome::Normalized(addr) => {
                assert_eq!(addr.street, "123 MAIN ST");
                assert_eq!(addr.city, "SPRINGFIELD");
                assert_eq!(addr.region, "IL");
                assert_eq!(addr.postal_code, "62701");
                assert_eq!(addr.match_quality, MatchQuality::Approximate);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn missing_components_fail_with_the_right_reason() {
        let record = RawAddressRecord::new(2, "123 Main St").with_city("Springfield");
        let outcome = HeuristicNormalizer::new().normalize(&record).unwrap();
        match outcome {
            NormalizeOutcome::Failed(f) => {
                assert_eq!(f.key, 2);
                assert_eq!(f.reason, FailureReason::MissingFields);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn bad_postal_code_is_unparseable() {
        let mut record = full_record(3);
        record.postal_code = Some("627XX".into());
        let outcome = HeuristicNormalizer::new().normalize(&record).unwrap();
        assert!(matches!(
            outcome,
            NormalizeOutcome::Failed(f) if f.reason == FailureReason::Unparseable
        ));
    }

    #[test]
    fn street_without_house_number_is_postal_only() {
        let mut record = full_record(4);
        record.line_one = "Main St".into();
        let outcome = HeuristicNormalizer::new().normalize(&record).unwrap();
        assert!(matches!(
            outcome,
            NormalizeOutcome::Normalized(a) if a.match_quality == MatchQuality::PostalOnly
        ));
    }
}
