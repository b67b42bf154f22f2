use serde::{Deserialize, Serialize};

/// A raw address row as stored in the source table. Field contents are
/// unstructured or semistructured text; only `key` is guaranteed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAddressRecord {
    /// Primary key of the source row, strictly ascending across the table.
    pub key: i64,
    pub line_one: String,
    pub line_two: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
}

impl RawAddressRecord {
    pub fn new(key: i64, line_one: impl Into<String>) -> Self {
        Self {
            key,
            line_one: line_one.into(),
            line_two: None,
            city: None,
            region: None,
            postal_code: None,
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }
}

/// Confidence of the normalization match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchQuality {
    /// Full match against reference data, down to the unit.
    Verified,
    /// Street-level match with interpolated or inferred components.
    Approximate,
    /// Only the postal code could be resolved.
    PostalOnly,
}

impl MatchQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchQuality::Verified => "verified",
            MatchQuality::Approximate => "approximate",
            MatchQuality::PostalOnly => "postal_only",
        }
    }
}

impl std::fmt::Display for MatchQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical form of one address, keyed by the source row it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAddress {
    pub key: i64,
    pub street: String,
    pub unit: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub match_quality: MatchQuality,
}
