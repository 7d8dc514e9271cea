//! Pipeline tuning knobs with production defaults.

use serde::{Deserialize, Serialize};

/// Tuning parameters for one scoring request.
///
/// Defaults reflect the deployed configuration: a 30-day lab-sample match
/// window, a 7-point smoothing window, and a 4000-hour trend window at the
/// nominal 20 hours of operation per telemetry record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Maximum |telemetry − lab| timestamp distance, in days, for a lab
    /// sample to be attached during alignment. Boundary inclusive.
    pub time_window_days: i64,
    /// Centered moving-average window for health-score smoothing. Odd;
    /// even values are widened to the next odd.
    pub smooth_window: usize,
    /// Operating hours of history required before a unit gets an RUL
    /// prediction.
    pub required_trend_hour: u32,
    /// Nominal operating hours represented by one telemetry record.
    pub hours_per_record: u32,
    /// Health score at which a component is considered due for intervention.
    /// The RUL estimator extrapolates to this crossing.
    pub failure_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            time_window_days: 30,
            smooth_window: 7,
            required_trend_hour: 4000,
            hours_per_record: 20,
            failure_threshold: 50.0,
        }
    }
}

impl ScoringConfig {
    /// Number of telemetry records that make up the trend window:
    /// `floor(required_trend_hour / hours_per_record)`.
    pub fn required_trend_record(&self) -> usize {
        (self.required_trend_hour / self.hours_per_record.max(1)) as usize
    }
}
