//! Scoring orchestration: request in, health-score series (and optionally
//! RUL predictions) out.
//!
//! The orchestrator sequences the external pipelines and the three in-house
//! algorithms per unit:
//!
//! ```text
//! vhms → prep → align(pap → prep) → score → per-unit smooth → series
//!                                           per-unit window → RUL
//! ```
//!
//! Units are processed independently: smoothing never crosses a unit
//! boundary, and a unit without enough trend history is skipped silently
//! instead of failing the batch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::align::align;
use crate::config::ScoringConfig;
use crate::error::ScoringError;
use crate::record::{HealthScorePoint, LabRecord, OneOrMany, TelemetryRecord};
use crate::registry::ModelRegistry;
use crate::smooth::smooth;
use crate::transform::{FeatureRow, SCORE_FIELD, Transformer};
use crate::trend::{RulPrediction, estimate_rul};

/// A scoring request as received on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthScoreRequest {
    pub unit_model: Option<String>,
    pub component: Option<String>,
    pub vhms: Option<OneOrMany<TelemetryRecord>>,
    pub pap: Option<OneOrMany<LabRecord>>,
}

impl HealthScoreRequest {
    /// Deserialize a request from a JSON value, mapping malformed payloads
    /// to the input-shape error.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ScoringError> {
        serde_json::from_value(value).map_err(|_| ScoringError::InvalidShape)
    }

    /// Deserialize a request from raw JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, ScoringError> {
        serde_json::from_str(raw).map_err(|_| ScoringError::InvalidShape)
    }
}

/// The scoring response. `rul_prediction` is present only after
/// [`add_rul_prediction`] ran. The identity echo fields sort above the data
/// arrays in serialized output, matching the wire convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthScoreResponse {
    #[serde(rename = "_unit_model")]
    pub unit_model: String,
    #[serde(rename = "_component")]
    pub component: String,
    pub health_score_data: Vec<HealthScorePoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rul_prediction: Option<Vec<RulPrediction>>,
}

/// Run the health-score pipeline for one request.
///
/// Fatal errors (missing fields, unknown model, broken artifacts, pipelines
/// breaking row alignment) abort the whole request; nothing partial is
/// returned.
pub fn calculate_health_score(
    request: HealthScoreRequest,
    registry: &ModelRegistry,
    config: &ScoringConfig,
) -> Result<HealthScoreResponse, ScoringError> {
    let unit_model = required_field(request.unit_model.as_deref(), "unit_model")?;
    let component = required_field(request.component.as_deref(), "component")?;

    let vhms: Vec<TelemetryRecord> = request
        .vhms
        .filter(|records| !records.is_empty())
        .ok_or(ScoringError::MissingField("vhms"))?
        .into_vec();
    let pap: Option<Vec<LabRecord>> = request
        .pap
        .map(OneOrMany::into_vec)
        .filter(|records| !records.is_empty());

    let bundle = registry.resolve(&unit_model, &component)?;

    // Feature prep for both streams. Row alignment with the source records
    // is checked at every pipeline boundary.
    let vhms_rows = checked_transform(
        &bundle.vhms_prep,
        "vhms_prep",
        vhms.iter().map(|r| telemetry_features(r)).collect(),
    )?;
    let pap_rows = match &pap {
        Some(records) => Some(checked_transform(
            &bundle.pap_prep,
            "pap_prep",
            records.iter().map(|r| numeric_features(&r.metrics)).collect(),
        )?),
        None => None,
    };

    let aligned = align(&vhms, pap.as_deref(), config.time_window_days)?;

    // Merge each telemetry row with its matched lab features (if any) and
    // the with_pap indicator, then score.
    let pap_by_lab_num: HashMap<&str, &FeatureRow> = match (&pap, &pap_rows) {
        (Some(records), Some(rows)) => records
            .iter()
            .zip(rows)
            .map(|(record, row)| (record.lab_num.as_str(), row))
            .collect(),
        _ => HashMap::new(),
    };
    let scoring_rows: Vec<FeatureRow> = vhms_rows
        .into_iter()
        .zip(&aligned)
        .map(|(mut row, joined)| {
            if let Some(lab_row) = joined
                .lab_num
                .as_deref()
                .and_then(|num| pap_by_lab_num.get(num))
            {
                row.extend(lab_row.iter().map(|(k, v)| (k.clone(), *v)));
            }
            row.insert(
                "with_pap".to_string(),
                if joined.with_pap { 1.0 } else { 0.0 },
            );
            row
        })
        .collect();

    let scored = checked_transform(&bundle.scoring, "scoring", scoring_rows)?;
    let raw_scores: Vec<f64> = scored
        .iter()
        .map(|row| {
            row.get(SCORE_FIELD)
                .copied()
                .ok_or(ScoringError::MissingScoreColumn(SCORE_FIELD))
        })
        .collect::<Result<_, _>>()?;

    // Smooth per unit, never across unit boundaries, and emit the series
    // grouped by serial number in encounter order.
    let mut health_score_data = Vec::with_capacity(aligned.len());
    for (serial, indices) in group_by_serial(aligned.iter().map(|r| r.serial_number.as_str())) {
        let unit_raw: Vec<f64> = indices.iter().map(|&i| raw_scores[i]).collect();
        let unit_smoothed = smooth(&unit_raw, config.smooth_window);
        log::debug!("unit {serial}: scored {} records", indices.len());
        for (&i, score) in indices.iter().zip(unit_smoothed) {
            health_score_data.push(HealthScorePoint {
                serial_number: aligned[i].serial_number.clone(),
                smr: aligned[i].smr,
                timestamp: aligned[i].timestamp.clone(),
                health_score: score,
                pap_ref_lab_num: aligned[i].lab_num.clone(),
            });
        }
    }
    log::info!(
        "health score computed: {} record(s), model `{}`",
        health_score_data.len(),
        bundle.model_id()
    );

    Ok(HealthScoreResponse {
        unit_model: unit_model.to_uppercase(),
        component,
        health_score_data,
        rul_prediction: None,
    })
}

/// Project RUL per unit from an already-computed health-score series.
///
/// Units with fewer than `required_trend_record` points are skipped —
/// silent omission, not an error. For the rest, the most recent window by
/// smr (re-sorted ascending) feeds the estimator. Aggregation follows the
/// encounter order of distinct serial numbers in the series.
pub fn add_rul_prediction(response: &mut HealthScoreResponse, config: &ScoringConfig) {
    let required = config.required_trend_record();
    let points = &response.health_score_data;

    let mut predictions = Vec::new();
    for (serial, indices) in group_by_serial(points.iter().map(|p| p.serial_number.as_str())) {
        if indices.len() < required {
            log::debug!(
                "unit {serial}: {} record(s) < trend window {required}, skipping RUL",
                indices.len()
            );
            continue;
        }
        let mut window: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (points[i].smr, points[i].health_score))
            .collect();
        window.sort_by(|a, b| a.0.total_cmp(&b.0));
        let window = &window[window.len() - required..];

        let smr: Vec<f64> = window.iter().map(|p| p.0).collect();
        let hs: Vec<f64> = window.iter().map(|p| p.1).collect();
        let fit = estimate_rul(&smr, &hs, config.failure_threshold);
        predictions.push(fit.for_unit(serial));
    }
    response.rul_prediction = Some(predictions);
}

fn required_field(value: Option<&str>, name: &'static str) -> Result<String, ScoringError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ScoringError::MissingField(name))
}

/// Numeric projection of a record's side fields; non-numeric values are the
/// prep pipeline's problem (imputation) and are dropped here.
fn numeric_features(fields: &std::collections::BTreeMap<String, serde_json::Value>) -> FeatureRow {
    fields
        .iter()
        .filter_map(|(name, value)| value.as_f64().map(|v| (name.clone(), v)))
        .collect()
}

fn telemetry_features(record: &TelemetryRecord) -> FeatureRow {
    let mut row = numeric_features(&record.sensors);
    row.insert("smr".to_string(), record.smr);
    row
}

fn checked_transform(
    pipeline: &dyn Transformer,
    name: &'static str,
    rows: Vec<FeatureRow>,
) -> Result<Vec<FeatureRow>, ScoringError> {
    let expected = rows.len();
    let out = pipeline.transform(rows)?;
    if out.len() != expected {
        return Err(ScoringError::PipelineMismatch {
            pipeline: name,
            got: out.len(),
            expected,
        });
    }
    Ok(out)
}

/// Group row indices by serial number, preserving encounter order of
/// distinct serials and row order within each group.
fn group_by_serial<'a>(serials: impl Iterator<Item = &'a str>) -> Vec<(String, Vec<usize>)> {
    let mut order: Vec<(String, Vec<usize>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (index, serial) in serials.enumerate() {
        match positions.get(serial) {
            Some(&at) => order[at].1.push(index),
            None => {
                positions.insert(serial.to_string(), order.len());
                order.push((serial.to_string(), vec![index]));
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModelManifest;
    use crate::transform::Stage;
    use crate::trend::TrendStatus;

    /// Bundle whose score is `100 - wear` (clamped to [0, 100]); extra
    /// weights let tests score merged lab fields like `with_pap`.
    fn test_registry(extra_weights: &[(&str, f64)]) -> ModelRegistry {
        let mut weights: std::collections::BTreeMap<String, f64> =
            [("wear".to_string(), -1.0)].into_iter().collect();
        for (name, w) in extra_weights {
            weights.insert(name.to_string(), *w);
        }
        let manifest = ModelManifest {
            unit_model: "PC200".to_string(),
            component: "engine".to_string(),
            vhms_prep: Default::default(),
            pap_prep: Default::default(),
            scoring: crate::transform::Pipeline {
                stages: vec![Stage::LinearScore {
                    weights,
                    intercept: 100.0,
                    min: 0.0,
                    max: 100.0,
                }],
            },
        };
        ModelRegistry::from_manifests([manifest])
    }

    fn telemetry(serial: &str, index: usize, wear: f64) -> TelemetryRecord {
        TelemetryRecord {
            serial_number: serial.to_string(),
            smr: index as f64 * 20.0,
            timestamp: format!("2024-01-01 {:02}:{:02}:00", index / 60 % 24, index % 60),
            sensors: [("wear".to_string(), serde_json::json!(wear))]
                .into_iter()
                .collect(),
        }
    }

    fn request(vhms: Vec<TelemetryRecord>, pap: Option<Vec<LabRecord>>) -> HealthScoreRequest {
        HealthScoreRequest {
            unit_model: Some("pc200".to_string()),
            component: Some("engine".to_string()),
            vhms: Some(OneOrMany::Many(vhms)),
            pap: pap.map(OneOrMany::Many),
        }
    }

    fn exact_config() -> ScoringConfig {
        // Window 1 keeps raw scores untouched so assertions can be exact.
        ScoringConfig {
            smooth_window: 1,
            ..ScoringConfig::default()
        }
    }

    #[test]
    fn missing_unit_model_rejected() {
        let mut req = request(vec![telemetry("A1", 0, 10.0)], None);
        req.unit_model = None;
        let err = calculate_health_score(req, &test_registry(&[]), &exact_config()).unwrap_err();
        assert!(matches!(err, ScoringError::MissingField("unit_model")));
    }

    #[test]
    fn blank_component_rejected() {
        let mut req = request(vec![telemetry("A1", 0, 10.0)], None);
        req.component = Some("  ".to_string());
        let err = calculate_health_score(req, &test_registry(&[]), &exact_config()).unwrap_err();
        assert!(matches!(err, ScoringError::MissingField("component")));
    }

    #[test]
    fn empty_vhms_rejected() {
        let mut req = request(vec![], None);
        req.vhms = Some(OneOrMany::Many(vec![]));
        let err = calculate_health_score(req, &test_registry(&[]), &exact_config()).unwrap_err();
        assert!(matches!(err, ScoringError::MissingField("vhms")));
    }

    #[test]
    fn unknown_model_is_fatal() {
        let mut req = request(vec![telemetry("A1", 0, 10.0)], None);
        req.component = Some("swing".to_string());
        let err = calculate_health_score(req, &test_registry(&[]), &exact_config()).unwrap_err();
        assert!(matches!(err, ScoringError::UnknownModel { .. }));
    }

    #[test]
    fn scores_flow_through_without_pap() {
        let req = request(vec![telemetry("A1", 0, 10.0), telemetry("A1", 1, 20.0)], None);
        let response =
            calculate_health_score(req, &test_registry(&[]), &exact_config()).unwrap();

        assert_eq!(response.unit_model, "PC200");
        assert_eq!(response.health_score_data.len(), 2);
        assert_eq!(response.health_score_data[0].health_score, 90.0);
        assert_eq!(response.health_score_data[1].health_score, 80.0);
        assert!(response.health_score_data.iter().all(|p| p.pap_ref_lab_num.is_none()));
        assert!(response.rul_prediction.is_none());
    }

    #[test]
    fn matched_lab_features_reach_the_scorer() {
        // with_pap contributes -5 on matched rows only.
        let registry = test_registry(&[("with_pap", -5.0)]);
        let vhms = vec![telemetry("A1", 0, 10.0)];
        let pap = vec![LabRecord {
            serial_number: "A1".to_string(),
            lab_num: "L-9".to_string(),
            timestamp: "2024-01-02".to_string(),
            metrics: Default::default(),
        }];
        let response =
            calculate_health_score(request(vhms, Some(pap)), &registry, &exact_config()).unwrap();

        assert_eq!(response.health_score_data[0].pap_ref_lab_num.as_deref(), Some("L-9"));
        assert_eq!(response.health_score_data[0].health_score, 85.0);
    }

    #[test]
    fn smoothing_never_crosses_unit_boundaries() {
        // Two units with different constant scores. Per-unit smoothing keeps
        // each constant; smoothing the flat series would blend the boundary.
        let mut vhms: Vec<_> = (0..20).map(|i| telemetry("A1", i, 20.0)).collect();
        vhms.extend((0..20).map(|i| telemetry("B2", i, 60.0)));
        let config = ScoringConfig {
            smooth_window: 7,
            ..ScoringConfig::default()
        };
        let response = calculate_health_score(request(vhms, None), &test_registry(&[]), &config).unwrap();

        for point in &response.health_score_data {
            let expected = if point.serial_number == "A1" { 80.0 } else { 40.0 };
            assert!(
                (point.health_score - expected).abs() < 1e-9,
                "unit {} leaked into neighbor: {}",
                point.serial_number,
                point.health_score
            );
        }
    }

    #[test]
    fn rul_gate_skips_unit_below_window() {
        // A1 has 200 points (exactly at the gate), B2 has 199.
        let mut vhms: Vec<_> = (0..200)
            .map(|i| telemetry("A1", i, 10.0 + i as f64 * 0.1))
            .collect();
        vhms.extend((0..199).map(|i| telemetry("B2", i, 10.0 + i as f64 * 0.1)));

        let mut response =
            calculate_health_score(request(vhms, None), &test_registry(&[]), &exact_config())
                .unwrap();
        add_rul_prediction(&mut response, &exact_config());

        let predictions = response.rul_prediction.unwrap();
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].serial_number, "A1");
        assert_eq!(predictions[0].fit.status, TrendStatus::Degrading);
    }

    #[test]
    fn rul_window_excludes_older_sentinel_points() {
        // 50 sentinel points (score clamps to 0) followed by 200 clean
        // decreasing points. The fit must match the clean window exactly.
        let mut vhms: Vec<_> = (0..50).map(|i| telemetry("A1", i, 500.0)).collect();
        vhms.extend((50..250).map(|i| telemetry("A1", i, 10.0 + (i - 50) as f64 * 0.1)));

        let mut response =
            calculate_health_score(request(vhms, None), &test_registry(&[]), &exact_config())
                .unwrap();
        add_rul_prediction(&mut response, &exact_config());

        let prediction = &response.rul_prediction.unwrap()[0];
        let expected_smr: Vec<f64> = (50..250).map(|i| i as f64 * 20.0).collect();
        let expected_hs: Vec<f64> = (0..200).map(|i| 90.0 - i as f64 * 0.1).collect();
        let expected = estimate_rul(&expected_smr, &expected_hs, 50.0);

        assert!((prediction.fit.slope - expected.slope).abs() < 1e-12);
        assert!((prediction.fit.intercept - expected.intercept).abs() < 1e-9);
        // A fit contaminated by the sentinel points would have positive slope.
        assert_eq!(prediction.fit.status, TrendStatus::Degrading);
    }

    #[test]
    fn rul_aggregation_follows_encounter_order() {
        let mut vhms: Vec<_> = (0..200)
            .map(|i| telemetry("B2", i, 10.0 + i as f64 * 0.1))
            .collect();
        vhms.extend((0..200).map(|i| telemetry("A1", i, 10.0 + i as f64 * 0.1)));

        let mut response =
            calculate_health_score(request(vhms, None), &test_registry(&[]), &exact_config())
                .unwrap();
        add_rul_prediction(&mut response, &exact_config());

        let serials: Vec<_> = response
            .rul_prediction
            .unwrap()
            .iter()
            .map(|p| p.serial_number.clone())
            .collect();
        assert_eq!(serials, vec!["B2", "A1"]);
    }

    #[test]
    fn request_shape_errors() {
        assert!(matches!(
            HealthScoreRequest::from_json_str("[1,2,3]"),
            Err(ScoringError::InvalidShape)
        ));
        assert!(matches!(
            HealthScoreRequest::from_json(serde_json::json!({"vhms": "not a record"})),
            Err(ScoringError::InvalidShape)
        ));
    }
}
