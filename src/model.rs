//! Domain types: detected labels and the per-image analysis record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout stored on every record (ISO-8601, UTC, second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A detected visual concept and how certain the service is about it.
///
/// Field names match the labeling service (`Name`, `Confidence`) so the JSON
/// form of a record reads the same as the service response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    #[serde(rename = "Name")]
    pub name: String,

    /// Percentage in [0, 100], rounded to 2 decimals
    #[serde(rename = "Confidence")]
    pub confidence: f64,
}

impl Label {
    /// Create a label, rounding the confidence to 2 decimal places.
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            confidence: round_confidence(confidence),
        }
    }
}

/// Round a confidence score to 2 decimal places.
pub fn round_confidence(confidence: f64) -> f64 {
    (confidence * 100.0).round() / 100.0
}

/// Labels recorded for one uploaded image, keyed by the object key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Remote object key, also the table's primary key
    pub filename: String,

    /// Labels in the order the service returned them
    pub labels: Vec<Label>,

    /// Write time, formatted with [`TIMESTAMP_FORMAT`]
    pub timestamp: String,

    /// CI branch the run belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl AnalysisRecord {
    /// Build a record stamped with the given time.
    ///
    /// An empty branch name is treated the same as no branch.
    pub fn new(
        filename: impl Into<String>,
        labels: Vec<Label>,
        branch: Option<&str>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            filename: filename.into(),
            labels,
            timestamp: format_timestamp(at),
            branch: branch.filter(|b| !b.is_empty()).map(str::to_string),
        }
    }
}

/// Format a UTC time as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
