//! Canonical request-scoped records shared across the pipeline.
//!
//! Two asynchronous streams feed the pipeline: continuous VHMS telemetry
//! (ordered by SMR, the machine's cumulative usage counter) and sparse PAP
//! lab samples keyed by a unique lab number. All records are immutable once
//! produced and nothing outlives the request.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ScoringError;

/// One VHMS telemetry record. `smr` is the primary ordering axis within a
/// unit; the wall-clock timestamp is carried alongside for lab alignment.
///
/// Sensor channels vary by equipment model, so everything beyond the identity
/// fields is kept as a flattened side map and interpreted by the prep
/// pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub serial_number: String,
    pub smr: f64,
    pub timestamp: String,
    #[serde(flatten)]
    pub sensors: BTreeMap<String, Value>,
}

/// One PAP lab-analysis sample. Sparse relative to telemetry; an entire
/// request may carry none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabRecord {
    pub serial_number: String,
    pub lab_num: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub metrics: BTreeMap<String, Value>,
}

/// A telemetry record after temporal alignment: the nearest in-tolerance lab
/// sample's `lab_num`, or `None` when no lab sample qualifies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedRecord {
    pub serial_number: String,
    pub smr: f64,
    pub timestamp: String,
    pub lab_num: Option<String>,
    pub with_pap: bool,
}

/// One point of the per-unit health-score series. Within a serial number,
/// points are unique by `(smr, timestamp)` and totally ordered on `smr`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthScorePoint {
    pub serial_number: String,
    pub smr: f64,
    pub timestamp: String,
    pub health_score: f64,
    pub pap_ref_lab_num: Option<String>,
}

/// A request field that accepts either a single JSON object or an array of
/// objects. Any other shape is an input shape error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Flatten into a vector; a single record becomes a one-element sequence.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(record) => vec![record],
            Self::Many(records) => records,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a wall-clock timestamp string.
///
/// Telemetry carries full `YYYY-MM-DD HH:MM:SS` stamps; lab reports are often
/// dated only, so a bare `YYYY-MM-DD` is accepted as midnight.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, ScoringError> {
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(ts);
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(ts) = date.and_hms_opt(0, 0, 0) {
            return Ok(ts);
        }
    }
    Err(ScoringError::InvalidTimestamp(raw.to_string()))
}
