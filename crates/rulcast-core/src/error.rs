//! Error taxonomy for the scoring pipeline.
//!
//! Input and artifact errors abort the whole request; per-unit data
//! insufficiency never appears here — it is handled by silent omission in the
//! orchestrator, and numeric degeneracy in trend fitting surfaces as a
//! [`TrendStatus`](crate::trend::TrendStatus) on the prediction instead.

use thiserror::Error;

/// Fatal request-level errors. No partial result is produced for any of these.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Request payload (or one of its record fields) is neither a single
    /// record nor a sequence of records.
    #[error("request payload must be a single record or a sequence of records")]
    InvalidShape,

    /// A required request field is absent or empty.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A timestamp string could not be parsed as wall-clock time.
    #[error("unrecognized timestamp `{0}`")]
    InvalidTimestamp(String),

    /// No model artifact exists for the requested model+component key.
    /// No fallback model is substituted.
    #[error("no model artifact registered for `{model_id}`")]
    UnknownModel { model_id: String },

    /// A model artifact exists but could not be read or parsed.
    #[error("failed to load model artifact `{path}`: {reason}")]
    Artifact { path: String, reason: String },

    /// A pipeline stage broke row alignment with its input.
    #[error("pipeline `{pipeline}` returned {got} rows for {expected} input rows")]
    PipelineMismatch {
        pipeline: &'static str,
        got: usize,
        expected: usize,
    },

    /// The scoring pipeline produced rows without a health-score column.
    #[error("scoring pipeline output is missing the `{0}` column")]
    MissingScoreColumn(&'static str),
}
