use crate::boosting::{GbtParams, GradientBoostedTrees};
use crate::error::{AppError, Result};
use ndarray::{Array1, Array2, Axis};
use ndarray_stats::QuantileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Feature subset frozen by recursive elimination.
///
/// `indices` point into the full fitted column list and stay in original
/// column order; inference must project onto exactly this subset, in this
/// order, after scaling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedFeatures {
    pub names: Vec<String>,
    pub indices: Vec<usize>,
}

impl SelectedFeatures {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Project a matrix in full-column layout onto the selected subset.
    pub fn project(&self, x: &Array2<f64>) -> Array2<f64> {
        x.select(Axis(1), &self.indices)
    }
}

/// Recursive feature elimination with a lightweight boosted-tree ranker.
///
/// Refits the ranker each round and removes the single least-important
/// feature (by total split gain) until `target` features remain. Columns
/// never used by any split rank lowest. When the table has no more than
/// `target` columns, everything is kept.
pub fn rfe_select(
    x: &Array2<f64>,
    y: &[u8],
    columns: &[String],
    target: usize,
    ranker_params: GbtParams,
) -> Result<SelectedFeatures> {
    if x.ncols() != columns.len() {
        return Err(AppError::Internal(format!(
            "matrix has {} columns but {} names were provided",
            x.ncols(),
            columns.len()
        )));
    }
    if target == 0 {
        return Err(AppError::Internal(
            "feature selection target must be positive".to_string(),
        ));
    }

    let mut active: Vec<usize> = (0..columns.len()).collect();
    if active.len() <= target {
        info!(
            "table has {} features, target is {}; keeping all",
            active.len(),
            target
        );
        return Ok(SelectedFeatures {
            names: columns.to_vec(),
            indices: active,
        });
    }

    info!(
        "recursive feature elimination: {} -> {} features",
        active.len(),
        target
    );

    while active.len() > target {
        let view = x.select(Axis(1), &active);
        let model = GradientBoostedTrees::fit(&view, y, ranker_params)?;
        let importance = Array1::from_vec(model.feature_importance());

        // argmin ties resolve to the earliest column, keeping elimination stable
        let weakest = importance
            .argmin()
            .map_err(|e| AppError::Internal(format!("importance ranking failed: {}", e)))?;

        debug!(
            "eliminating '{}' (gain {:.6}), {} features remain",
            columns[active[weakest]],
            importance[weakest],
            active.len() - 1
        );
        active.remove(weakest);
    }

    let names = active.iter().map(|&i| columns[i].clone()).collect();
    Ok(SelectedFeatures {
        names,
        indices: active,
    })
}
