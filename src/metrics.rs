use serde::{Deserialize, Serialize};

/// Binary confusion matrix
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ConfusionMatrix {
    /// Build from true labels and predicted classes
    pub fn from_predictions(y_true: &[u8], y_pred: &[u8]) -> Self {
        let mut cm = ConfusionMatrix::default();
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t, p) {
                (0, 0) => cm.true_negatives += 1,
                (0, _) => cm.false_positives += 1,
                (_, 0) => cm.false_negatives += 1,
                _ => cm.true_positives += 1,
            }
        }
        cm
    }

    /// Fraction of true disease cases correctly flagged (recall of class 1)
    pub fn sensitivity(&self) -> f64 {
        let denom = self.true_positives + self.false_negatives;
        if denom > 0 {
            self.true_positives as f64 / denom as f64
        } else {
            0.0
        }
    }

    /// Fraction of true non-disease cases correctly cleared (recall of class 0)
    pub fn specificity(&self) -> f64 {
        let denom = self.true_negatives + self.false_positives;
        if denom > 0 {
            self.true_negatives as f64 / denom as f64
        } else {
            0.0
        }
    }

    pub fn accuracy(&self) -> f64 {
        let total =
            self.true_negatives + self.false_positives + self.false_negatives + self.true_positives;
        if total > 0 {
            (self.true_negatives + self.true_positives) as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Area under the ROC curve via the rank-sum (Mann-Whitney) statistic.
///
/// Tied scores contribute half a rank. Returns 0.5 when either class is
/// absent, matching the uninformative-classifier convention.
pub fn roc_auc(y_true: &[u8], y_score: &[f64]) -> f64 {
    let n_pos = y_true.iter().filter(|&&y| y == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.5;
    }

    let mut rank_sum = 0.0;
    for (i, &yi) in y_true.iter().enumerate() {
        if yi != 1 {
            continue;
        }
        for (j, &yj) in y_true.iter().enumerate() {
            if yj == 1 {
                continue;
            }
            if y_score[i] > y_score[j] {
                rank_sum += 1.0;
            } else if y_score[i] == y_score[j] {
                rank_sum += 0.5;
            }
        }
    }

    rank_sum / (n_pos as f64 * n_neg as f64)
}

/// Held-out evaluation of a calibrated classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub roc_auc: f64,
    pub sensitivity: f64,
    pub specificity: f64,
    pub threshold: f64,
    pub confusion_matrix: ConfusionMatrix,
    pub n_samples: usize,
}

impl EvaluationReport {
    /// Evaluate positive-class probabilities against labels at a decision
    /// threshold (positive iff probability >= threshold).
    pub fn from_probabilities(y_true: &[u8], y_proba: &[f64], threshold: f64) -> Self {
        let y_pred: Vec<u8> = y_proba
            .iter()
            .map(|&p| if p >= threshold { 1 } else { 0 })
            .collect();
        let cm = ConfusionMatrix::from_predictions(y_true, &y_pred);

        Self {
            accuracy: cm.accuracy(),
            roc_auc: roc_auc(y_true, y_proba),
            sensitivity: cm.sensitivity(),
            specificity: cm.specificity(),
            threshold,
            confusion_matrix: cm,
            n_samples: y_true.len(),
        }
    }
}
