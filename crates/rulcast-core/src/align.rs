//! Temporal alignment of telemetry against sparse lab samples.
//!
//! An as-of join: each telemetry record picks the nearest same-unit lab
//! sample by absolute timestamp distance, accepted only within a tolerance
//! window. At most one lab sample attaches per telemetry record; one lab
//! sample may serve many telemetry records.
//!
//! Lab timestamps are indexed once per serial number and sorted, so each
//! telemetry record resolves with a binary search: O(T log L) per unit.

use chrono::{Duration, NaiveDateTime};
use std::collections::HashMap;

use crate::error::ScoringError;
use crate::record::{AlignedRecord, LabRecord, TelemetryRecord, parse_timestamp};

/// Sorted per-serial lab index entry: (timestamp, lab_num).
type LabEntry<'a> = (NaiveDateTime, &'a str);

/// Join telemetry records with their nearest in-tolerance lab sample.
///
/// With no lab data at all, every record comes back with `lab_num = None`
/// and `with_pap = false` — a fast path, not an error. Equidistant lab
/// candidates resolve to the earlier sample; among identical timestamps the
/// smallest `lab_num` wins, so the output is independent of input record
/// order.
pub fn align(
    telemetry: &[TelemetryRecord],
    lab: Option<&[LabRecord]>,
    tolerance_days: i64,
) -> Result<Vec<AlignedRecord>, ScoringError> {
    let lab = lab.unwrap_or(&[]);
    if lab.is_empty() {
        return Ok(telemetry.iter().map(unmatched).collect());
    }

    let by_serial = index_lab(lab)?;
    let tolerance = Duration::days(tolerance_days);

    let mut aligned = Vec::with_capacity(telemetry.len());
    for record in telemetry {
        let ts = parse_timestamp(&record.timestamp)?;
        let lab_num = by_serial
            .get(record.serial_number.as_str())
            .and_then(|entries| nearest(entries, ts, tolerance));
        aligned.push(AlignedRecord {
            serial_number: record.serial_number.clone(),
            smr: record.smr,
            timestamp: record.timestamp.clone(),
            with_pap: lab_num.is_some(),
            lab_num: lab_num.map(str::to_string),
        });
    }
    Ok(aligned)
}

fn unmatched(record: &TelemetryRecord) -> AlignedRecord {
    AlignedRecord {
        serial_number: record.serial_number.clone(),
        smr: record.smr,
        timestamp: record.timestamp.clone(),
        lab_num: None,
        with_pap: false,
    }
}

/// Group lab samples by serial number, sorted by (timestamp, lab_num).
/// The secondary key makes candidate selection a total order, so duplicate
/// timestamps resolve the same way regardless of input order.
fn index_lab<'a>(lab: &'a [LabRecord]) -> Result<HashMap<&'a str, Vec<LabEntry<'a>>>, ScoringError> {
    let mut by_serial: HashMap<&str, Vec<LabEntry<'_>>> = HashMap::new();
    for sample in lab {
        let ts = parse_timestamp(&sample.timestamp)?;
        by_serial
            .entry(sample.serial_number.as_str())
            .or_default()
            .push((ts, sample.lab_num.as_str()));
    }
    for entries in by_serial.values_mut() {
        entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    }
    Ok(by_serial)
}

/// Nearest lab entry to `ts` within `tolerance`, or `None`.
fn nearest<'a>(
    entries: &[LabEntry<'a>],
    ts: NaiveDateTime,
    tolerance: Duration,
) -> Option<&'a str> {
    // First entry at or after ts; the candidate before it is strictly earlier.
    let split = entries.partition_point(|(t, _)| *t < ts);
    let after = entries.get(split).map(|&(t, _)| (t - ts, split));
    let before = split.checked_sub(1).map(|i| {
        // Walk to the leftmost entry sharing this timestamp (smallest lab_num).
        let t = entries[i].0;
        let leftmost = entries.partition_point(|(u, _)| *u < t);
        (ts - t, leftmost)
    });

    let (distance, index) = match (before, after) {
        (None, None) => return None,
        (Some(b), None) => b,
        (None, Some(a)) => a,
        // Equidistant candidates resolve to the earlier sample.
        (Some(b), Some(a)) => {
            if a.0 < b.0 {
                a
            } else {
                b
            }
        }
    };

    (distance <= tolerance).then(|| entries[index].1)
}
