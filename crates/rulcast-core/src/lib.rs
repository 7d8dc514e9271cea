//! # rulcast-core
//!
//! **Health-score and remaining-useful-life estimation for heavy-equipment
//! components.**
//!
//! `rulcast-core` turns two asynchronous telemetry streams — continuous VHMS
//! sensor records and sparse PAP lab samples — into a per-unit degradation
//! health-score series, then projects Remaining Useful Life (RUL) from the
//! smoothed trend.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rulcast_core::{
//!     HealthScoreRequest, ModelRegistry, ScoringConfig,
//!     add_rul_prediction, calculate_health_score,
//! };
//!
//! let registry = ModelRegistry::load_dir(std::path::Path::new("model")).unwrap();
//! let config = ScoringConfig::default();
//!
//! let request = HealthScoreRequest::from_json_str(r#"{
//!     "unit_model": "pc200", "component": "engine",
//!     "vhms": [{"serial_number": "A100", "smr": 4120.0,
//!               "timestamp": "2024-03-01 08:00:00", "oil_temp": 81.5}]
//! }"#).unwrap();
//!
//! let mut response = calculate_health_score(request, &registry, &config).unwrap();
//! add_rul_prediction(&mut response, &config);
//! ```
//!
//! ## Architecture
//!
//! VHMS → prep pipeline → Temporal Aligner (PAP → prep pipeline) →
//! scoring pipeline → per-unit Trend Smoother → health-score series →
//! per-unit windowing → RUL Estimator
//!
//! The prep and scoring pipelines are pre-trained external collaborators,
//! reconstructed from JSON artifact manifests behind the [`Transformer`]
//! capability trait. The three in-house algorithms — [`align`], [`smooth`],
//! and [`estimate_rul`] — are pure functions of their inputs: no hidden
//! state, identical output for identical input. Units never share state, so
//! one unit's thin data can only ever omit that unit's own prediction.

pub mod align;
pub mod config;
pub mod error;
pub mod record;
pub mod registry;
pub mod scoring;
pub mod smooth;
pub mod transform;
pub mod trend;

pub use align::align;
pub use config::ScoringConfig;
pub use error::ScoringError;
pub use record::{
    AlignedRecord, HealthScorePoint, LabRecord, OneOrMany, TelemetryRecord, parse_timestamp,
};
pub use registry::{ModelManifest, ModelRegistry, model_id};
pub use scoring::{
    HealthScoreRequest, HealthScoreResponse, add_rul_prediction, calculate_health_score,
};
pub use smooth::smooth;
pub use transform::{FeatureRow, Pipeline, SCORE_FIELD, Stage, Transformer};
pub use trend::{RulPrediction, TrendFit, TrendStatus, estimate_rul};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
