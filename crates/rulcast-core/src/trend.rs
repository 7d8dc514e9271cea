//! Degradation trend fitting and remaining-useful-life extrapolation.
//!
//! An ordinary least squares line is fitted to a bounded recent window of
//! (smr, health_score) points; the negative slope is the degradation rate in
//! health-score units per SMR hour, and the crossing of a failure threshold
//! gives the remaining usage. The estimator is a total, deterministic
//! function over well-formed input — the minimum-data gate lives in the
//! orchestrator, and a non-degrading fit is a status, not an error.

use serde::{Deserialize, Serialize};

/// Outcome of a trend fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStatus {
    /// Health score is decreasing; a threshold crossing was projected.
    Degrading,
    /// Health score is flat or improving; no finite RUL exists.
    NonDegrading,
    /// The window has no usable spread (too few points or constant smr).
    Degenerate,
}

/// Fitted trend parameters and the projected remaining usage for one unit.
///
/// `remaining_smr_hours` is present only for a degrading trend, and clamps
/// to zero when the fitted line already sits below the threshold at the
/// newest point — never negative, never infinite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendFit {
    pub slope: f64,
    pub intercept: f64,
    pub current_smr: f64,
    pub current_health_score: f64,
    pub failure_threshold: f64,
    pub predicted_failure_smr: Option<f64>,
    pub remaining_smr_hours: Option<f64>,
    pub status: TrendStatus,
}

/// A trend fit attributed to its unit, ready for response aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulPrediction {
    pub serial_number: String,
    #[serde(flatten)]
    pub fit: TrendFit,
}

impl TrendFit {
    /// Attach the owning unit's serial number.
    pub fn for_unit(self, serial_number: impl Into<String>) -> RulPrediction {
        RulPrediction {
            serial_number: serial_number.into(),
            fit: self,
        }
    }
}

/// Fit a degradation line to `(smr, hs)` and extrapolate to the failure
/// threshold.
///
/// The caller supplies the window already selected (most recent
/// `required_trend_record` points) and re-sorted ascending by smr.
pub fn estimate_rul(smr: &[f64], hs: &[f64], failure_threshold: f64) -> TrendFit {
    let n = smr.len().min(hs.len());
    let last = n.checked_sub(1);
    let current_smr = last.map(|i| smr[i]).unwrap_or(0.0);
    let current_health_score = last.map(|i| hs[i]).unwrap_or(0.0);

    let degenerate = |status: TrendStatus| TrendFit {
        slope: 0.0,
        intercept: current_health_score,
        current_smr,
        current_health_score,
        failure_threshold,
        predicted_failure_smr: None,
        remaining_smr_hours: None,
        status,
    };

    if n < 2 {
        return degenerate(TrendStatus::Degenerate);
    }

    let mean_smr = smr[..n].iter().sum::<f64>() / n as f64;
    let mean_hs = hs[..n].iter().sum::<f64>() / n as f64;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for i in 0..n {
        let dx = smr[i] - mean_smr;
        sxx += dx * dx;
        sxy += dx * (hs[i] - mean_hs);
    }
    if sxx < 1e-12 {
        return degenerate(TrendStatus::Degenerate);
    }

    let slope = sxy / sxx;
    let intercept = mean_hs - slope * mean_smr;

    if slope >= 0.0 {
        return TrendFit {
            slope,
            intercept,
            current_smr,
            current_health_score,
            failure_threshold,
            predicted_failure_smr: None,
            remaining_smr_hours: None,
            status: TrendStatus::NonDegrading,
        };
    }

    let crossing_smr = (failure_threshold - intercept) / slope;
    TrendFit {
        slope,
        intercept,
        current_smr,
        current_health_score,
        failure_threshold,
        predicted_failure_smr: Some(crossing_smr),
        remaining_smr_hours: Some((crossing_smr - current_smr).max(0.0)),
        status: TrendStatus::Degrading,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_decay_projects_exact_crossing() {
        // hs = 100 - 0.5*smr; threshold 50 crosses at smr = 100.
        let smr: Vec<f64> = (0..10).map(|i| i as f64 * 10.0).collect();
        let hs: Vec<f64> = smr.iter().map(|x| 100.0 - 0.5 * x).collect();
        let fit = estimate_rul(&smr, &hs, 50.0);

        assert_eq!(fit.status, TrendStatus::Degrading);
        assert!((fit.slope + 0.5).abs() < 1e-9);
        assert!((fit.intercept - 100.0).abs() < 1e-9);
        assert!((fit.predicted_failure_smr.unwrap() - 100.0).abs() < 1e-9);
        assert!((fit.remaining_smr_hours.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn improving_trend_has_no_rul() {
        let smr: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let hs: Vec<f64> = smr.iter().map(|x| 60.0 + 0.1 * x).collect();
        let fit = estimate_rul(&smr, &hs, 50.0);

        assert_eq!(fit.status, TrendStatus::NonDegrading);
        assert_eq!(fit.remaining_smr_hours, None);
        assert_eq!(fit.predicted_failure_smr, None);
    }

    #[test]
    fn flat_trend_is_non_degrading() {
        let smr: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let hs = vec![70.0; 20];
        let fit = estimate_rul(&smr, &hs, 50.0);
        assert_eq!(fit.status, TrendStatus::NonDegrading);
    }

    #[test]
    fn constant_smr_is_degenerate() {
        let smr = vec![500.0; 5];
        let hs = vec![90.0, 85.0, 80.0, 75.0, 70.0];
        let fit = estimate_rul(&smr, &hs, 50.0);
        assert_eq!(fit.status, TrendStatus::Degenerate);
        assert_eq!(fit.remaining_smr_hours, None);
    }

    #[test]
    fn empty_and_single_point_windows_are_degenerate() {
        assert_eq!(estimate_rul(&[], &[], 50.0).status, TrendStatus::Degenerate);
        assert_eq!(
            estimate_rul(&[10.0], &[80.0], 50.0).status,
            TrendStatus::Degenerate
        );
    }

    #[test]
    fn already_crossed_clamps_to_zero() {
        // hs = 60 - 1.0*smr is already below threshold 50 at smr 90.
        let smr: Vec<f64> = (80..=90).map(|i| i as f64).collect();
        let hs: Vec<f64> = smr.iter().map(|x| 60.0 - x).collect();
        let fit = estimate_rul(&smr, &hs, 50.0);

        assert_eq!(fit.status, TrendStatus::Degrading);
        assert_eq!(fit.remaining_smr_hours, Some(0.0));
    }

    #[test]
    fn identical_input_yields_identical_output() {
        let smr: Vec<f64> = (0..50).map(|i| i as f64 * 3.0).collect();
        let hs: Vec<f64> = smr.iter().map(|x| 95.0 - 0.2 * x).collect();
        let a = estimate_rul(&smr, &hs, 50.0);
        let b = estimate_rul(&smr, &hs, 50.0);
        assert_eq!(a.slope.to_bits(), b.slope.to_bits());
        assert_eq!(
            a.remaining_smr_hours.map(f64::to_bits),
            b.remaining_smr_hours.map(f64::to_bits)
        );
    }

    #[test]
    fn serial_number_attaches_for_aggregation() {
        let fit = estimate_rul(&[0.0, 1.0], &[90.0, 80.0], 50.0);
        let prediction = fit.for_unit("A100");
        assert_eq!(prediction.serial_number, "A100");
    }
}
