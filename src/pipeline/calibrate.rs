use crate::error::{AppError, Result};
use crate::metrics::ConfusionMatrix;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Candidate decision thresholds swept during calibration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdGrid {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl Default for ThresholdGrid {
    fn default() -> Self {
        Self {
            start: 0.05,
            end: 0.90,
            step: 0.01,
        }
    }
}

impl ThresholdGrid {
    /// Grid points computed from integer steps to keep the sweep exact
    pub fn values(&self) -> Vec<f64> {
        let n = ((self.end - self.start) / self.step).round() as usize;
        (0..=n).map(|i| self.start + i as f64 * self.step).collect()
    }
}

/// Operating point chosen by calibration.
///
/// `floor_met` is false when no threshold reached the sensitivity target
/// and the max-sensitivity fallback was used instead; callers must surface
/// that as a degraded-calibration condition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalibrationOutcome {
    pub threshold: f64,
    pub sensitivity: f64,
    pub specificity: f64,
    pub sensitivity_floor: f64,
    pub floor_met: bool,
}

/// Sweep the grid on held-out probabilities and pick the threshold that
/// maximizes specificity subject to sensitivity >= the floor. Falls back to
/// the maximum-sensitivity threshold when the floor is unreachable.
pub fn calibrate_threshold(
    y_true: &[u8],
    y_proba: &[f64],
    grid: &ThresholdGrid,
    sensitivity_floor: f64,
) -> Result<CalibrationOutcome> {
    if y_true.is_empty() || y_true.len() != y_proba.len() {
        return Err(AppError::Calibration(format!(
            "held-out labels ({}) and probabilities ({}) must be non-empty and aligned",
            y_true.len(),
            y_proba.len()
        )));
    }

    let classify = |threshold: f64| -> ConfusionMatrix {
        let y_pred: Vec<u8> = y_proba
            .iter()
            .map(|&p| if p >= threshold { 1 } else { 0 })
            .collect();
        ConfusionMatrix::from_predictions(y_true, &y_pred)
    };

    let mut best: Option<CalibrationOutcome> = None;
    for threshold in grid.values() {
        let cm = classify(threshold);
        let sensitivity = cm.sensitivity();
        let specificity = cm.specificity();

        if sensitivity >= sensitivity_floor
            && specificity > best.map_or(0.0, |b| b.specificity)
        {
            best = Some(CalibrationOutcome {
                threshold,
                sensitivity,
                specificity,
                sensitivity_floor,
                floor_met: true,
            });
        }
    }

    if let Some(outcome) = best {
        info!(
            "calibrated threshold {:.2} (sensitivity {:.4}, specificity {:.4})",
            outcome.threshold, outcome.sensitivity, outcome.specificity
        );
        return Ok(outcome);
    }

    // floor unreachable: best-effort maximum sensitivity, loudly
    warn!(
        "no threshold reached sensitivity {:.2}; falling back to maximum sensitivity",
        sensitivity_floor
    );
    let start_cm = classify(grid.start);
    let mut fallback = CalibrationOutcome {
        threshold: grid.start,
        sensitivity: start_cm.sensitivity(),
        specificity: start_cm.specificity(),
        sensitivity_floor,
        floor_met: false,
    };
    for threshold in grid.values() {
        let cm = classify(threshold);
        let sensitivity = cm.sensitivity();
        if sensitivity > fallback.sensitivity {
            fallback = CalibrationOutcome {
                threshold,
                sensitivity,
                specificity: cm.specificity(),
                sensitivity_floor,
                floor_met: false,
            };
        }
    }

    info!(
        "fallback threshold {:.2} (sensitivity {:.4}, specificity {:.4})",
        fallback.threshold, fallback.sensitivity, fallback.specificity
    );
    Ok(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_values_cover_range() {
        let grid = ThresholdGrid::default();
        let values = grid.values();

        assert!((values[0] - 0.05).abs() < 1e-12);
        assert!((values[values.len() - 1] - 0.90).abs() < 1e-9);
        assert_eq!(values.len(), 86);
    }

    #[test]
    fn test_separable_scores_meet_floor() {
        // positives all score above 0.8, negatives below 0.3
        let y_true: Vec<u8> = (0..100).map(|i| if i < 20 { 1 } else { 0 }).collect();
        let y_proba: Vec<f64> = (0..100)
            .map(|i| if i < 20 { 0.85 + (i % 5) as f64 * 0.01 } else { 0.1 + (i % 10) as f64 * 0.02 })
            .collect();

        let outcome =
            calibrate_threshold(&y_true, &y_proba, &ThresholdGrid::default(), 0.98).unwrap();

        assert!(outcome.floor_met);
        assert!(outcome.sensitivity >= 0.98);
        assert!((outcome.specificity - 1.0).abs() < 1e-12);
        // first grid point clearing every negative score (max 0.28)
        assert!(outcome.threshold > 0.28);
    }

    #[test]
    fn test_unreachable_floor_falls_back_to_max_sensitivity() {
        // every positive scores below every negative: the floor cannot be
        // met with any specificity above zero except at the lowest cut
        let y_true = vec![1, 1, 0, 0];
        let y_proba = vec![0.02, 0.03, 0.95, 0.96];

        let outcome =
            calibrate_threshold(&y_true, &y_proba, &ThresholdGrid::default(), 0.98).unwrap();

        assert!(!outcome.floor_met);
        // no grid threshold sits below the positives, so everything is
        // class 0 at best and sensitivity is 0 at every point
        assert_eq!(outcome.sensitivity, 0.0);
    }

    #[test]
    fn test_monotonicity_over_grid() {
        let y_true: Vec<u8> = (0..50).map(|i| if i % 3 == 0 { 1 } else { 0 }).collect();
        let y_proba: Vec<f64> = (0..50).map(|i| (i as f64 * 0.019) % 1.0).collect();

        let grid = ThresholdGrid::default();
        let mut last_sensitivity = f64::INFINITY;
        let mut last_specificity = -1.0;
        for threshold in grid.values() {
            let y_pred: Vec<u8> = y_proba
                .iter()
                .map(|&p| if p >= threshold { 1 } else { 0 })
                .collect();
            let cm = ConfusionMatrix::from_predictions(&y_true, &y_pred);

            assert!(cm.sensitivity() <= last_sensitivity + 1e-12);
            assert!(cm.specificity() >= last_specificity - 1e-12);
            last_sensitivity = cm.sensitivity();
            last_specificity = cm.specificity();
        }
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let err = calibrate_threshold(&[], &[], &ThresholdGrid::default(), 0.98).unwrap_err();
        assert_eq!(err.error_code(), "CALIBRATION_ERROR");
    }
}
