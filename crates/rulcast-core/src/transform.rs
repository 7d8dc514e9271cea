//! Opaque tabular transformers.
//!
//! The pre-trained feature-preparation and scoring pipelines are external
//! collaborators: tabular rows in, tabular rows out. The core only sees the
//! [`Transformer`] capability; concrete stages are reconstructed from the
//! model artifact manifest and composed into a [`Pipeline`].
//!
//! Every stage preserves row count and row order — the orchestrator checks
//! this at each boundary so a misbehaving artifact cannot silently shift
//! scores between records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ScoringError;

/// One tabular row: named numeric features.
pub type FeatureRow = BTreeMap<String, f64>;

/// Column name carrying the raw health score out of a scoring pipeline.
pub const SCORE_FIELD: &str = "health_score";

/// Capability interface for a loaded pipeline: tabular in, tabular out.
pub trait Transformer: Send + Sync {
    fn transform(&self, rows: Vec<FeatureRow>) -> Result<Vec<FeatureRow>, ScoringError>;
}

/// Per-field standardization parameters fitted offline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldScale {
    pub name: String,
    pub mean: f64,
    pub std: f64,
}

/// A single manifest-declared transform stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stage {
    /// Fill absent fields with a constant.
    Impute { fields: Vec<String>, fill: f64 },
    /// Standardize fields as `(x - mean) / std`.
    Scale { fields: Vec<FieldScale> },
    /// Keep only the listed fields.
    Select { fields: Vec<String> },
    /// Weighted linear combination clamped to `[min, max]`; replaces each
    /// row with a single `health_score` column. Absent features contribute
    /// nothing (upstream imputation decides their value).
    LinearScore {
        weights: BTreeMap<String, f64>,
        intercept: f64,
        min: f64,
        max: f64,
    },
}

impl Transformer for Stage {
    fn transform(&self, mut rows: Vec<FeatureRow>) -> Result<Vec<FeatureRow>, ScoringError> {
        match self {
            Stage::Impute { fields, fill } => {
                for row in &mut rows {
                    for field in fields {
                        row.entry(field.clone()).or_insert(*fill);
                    }
                }
                Ok(rows)
            }
            Stage::Scale { fields } => {
                for row in &mut rows {
                    for scale in fields {
                        if let Some(value) = row.get_mut(&scale.name) {
                            *value = if scale.std.abs() < 1e-12 {
                                0.0
                            } else {
                                (*value - scale.mean) / scale.std
                            };
                        }
                    }
                }
                Ok(rows)
            }
            Stage::Select { fields } => {
                for row in &mut rows {
                    row.retain(|name, _| fields.iter().any(|f| f == name));
                }
                Ok(rows)
            }
            Stage::LinearScore {
                weights,
                intercept,
                min,
                max,
            } => Ok(rows
                .iter()
                .map(|row| {
                    let score = weights
                        .iter()
                        .map(|(name, w)| w * row.get(name).copied().unwrap_or(0.0))
                        .sum::<f64>()
                        + intercept;
                    let mut out = FeatureRow::new();
                    out.insert(SCORE_FIELD.to_string(), score.clamp(*min, *max));
                    out
                })
                .collect()),
        }
    }
}

/// An ordered stage composition. The unit pipeline (no stages) passes rows
/// through unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub stages: Vec<Stage>,
}

impl Transformer for Pipeline {
    fn transform(&self, rows: Vec<FeatureRow>) -> Result<Vec<FeatureRow>, ScoringError> {
        self.stages
            .iter()
            .try_fold(rows, |rows, stage| stage.transform(rows))
    }
}
