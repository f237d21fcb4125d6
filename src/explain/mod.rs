//! Per-prediction feature attribution.
//!
//! Explanation is a best-effort diagnostic: any failure inside the
//! explainer degrades to an empty contributor list and never blocks the
//! classification itself.

pub mod treeshap;

use crate::boosting::GradientBoostedTrees;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub use treeshap::{expected_margin, shap_values, tree_shap};

/// Number of contributors returned per prediction
pub const TOP_K_CONTRIBUTORS: usize = 5;

/// One contributing factor of a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    /// Canonical feature name
    pub feature: String,

    /// Signed contribution to the positive-class margin
    pub impact: f64,

    /// Observed untransformed value of the feature
    pub value: f64,
}

/// Shapley-value explainer bound to a trained ensemble
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TreeExplainer {
    top_k: usize,
}

impl Default for TreeExplainer {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeExplainer {
    pub fn new() -> Self {
        Self {
            top_k: TOP_K_CONTRIBUTORS,
        }
    }

    /// Rank the selected features of one scaled row by absolute attribution
    /// and return the strongest contributors with their raw observed values.
    ///
    /// `feature_names` and `raw_values` run parallel to `scaled_row`.
    /// Returns an empty list when attribution cannot be computed.
    pub fn top_contributors(
        &self,
        model: &GradientBoostedTrees,
        scaled_row: ArrayView1<'_, f64>,
        feature_names: &[String],
        raw_values: &[f64],
    ) -> Vec<Contributor> {
        if feature_names.len() != scaled_row.len() || raw_values.len() != scaled_row.len() {
            warn!(
                expected = scaled_row.len(),
                names = feature_names.len(),
                values = raw_values.len(),
                "explainer input widths disagree; returning no contributors"
            );
            return Vec::new();
        }

        let phi = match shap_values(model, scaled_row) {
            Some(phi) => phi,
            None => {
                warn!("attribution unavailable for this model; returning no contributors");
                return Vec::new();
            }
        };

        let mut contributors: Vec<Contributor> = phi
            .into_iter()
            .enumerate()
            .map(|(i, impact)| Contributor {
                feature: feature_names[i].clone(),
                impact,
                value: raw_values[i],
            })
            .collect();

        contributors.sort_by(|a, b| b.impact.abs().total_cmp(&a.impact.abs()));
        contributors.truncate(self.top_k);
        contributors
    }
}
