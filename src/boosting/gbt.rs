use crate::boosting::tree::{RegressionTree, TreeParams};
use crate::error::{AppError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Boosting hyperparameters.
///
/// Values are tuning choices; the class-imbalance compensation
/// (`scale_pos_weight`) is a contract and must be set from the observed
/// label ratio of the training split.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GbtParams {
    /// Number of boosting rounds
    pub n_rounds: usize,

    /// Shrinkage applied to each tree's contribution
    pub learning_rate: f64,

    pub max_depth: usize,

    /// L2 regularization on leaf weights
    pub lambda: f64,

    /// Minimum split gain
    pub gamma: f64,

    /// Minimum hessian sum per child
    pub min_child_weight: f64,

    /// Weight multiplier for positive-class instances (n_neg / n_pos)
    pub scale_pos_weight: f64,
}

impl Default for GbtParams {
    fn default() -> Self {
        Self {
            n_rounds: 200,
            learning_rate: 0.1,
            max_depth: 5,
            lambda: 1.0,
            gamma: 0.0,
            min_child_weight: 1.0,
            scale_pos_weight: 1.0,
        }
    }
}

impl GbtParams {
    pub fn with_scale_pos_weight(mut self, scale_pos_weight: f64) -> Self {
        self.scale_pos_weight = scale_pos_weight;
        self
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            lambda: self.lambda,
            gamma: self.gamma,
            min_child_weight: self.min_child_weight,
        }
    }
}

/// Gradient-boosted tree ensemble for binary classification with logistic
/// loss. Deterministic: no row or column subsampling, so identical inputs
/// produce identical ensembles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    params: GbtParams,
    trees: Vec<RegressionTree>,
    base_margin: f64,
    n_features: usize,
}

fn sigmoid(margin: f64) -> f64 {
    if margin >= 0.0 {
        1.0 / (1.0 + (-margin).exp())
    } else {
        let e = margin.exp();
        e / (1.0 + e)
    }
}

impl GradientBoostedTrees {
    /// Fit the ensemble on a feature matrix and binary labels.
    pub fn fit(x: &Array2<f64>, y: &[u8], params: GbtParams) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(AppError::Data("cannot fit on an empty matrix".to_string()));
        }
        if x.nrows() != y.len() {
            return Err(AppError::Internal(format!(
                "feature matrix has {} rows but {} labels were provided",
                x.nrows(),
                y.len()
            )));
        }

        let n = x.nrows();
        let tree_params = params.tree_params();
        let mut margins = vec![0.0f64; n];
        let mut grad = vec![0.0f64; n];
        let mut hess = vec![0.0f64; n];
        let mut trees = Vec::with_capacity(params.n_rounds);

        for round in 0..params.n_rounds {
            for i in 0..n {
                let weight = if y[i] == 1 {
                    params.scale_pos_weight
                } else {
                    1.0
                };
                let p = sigmoid(margins[i]);
                grad[i] = weight * (p - y[i] as f64);
                hess[i] = (weight * p * (1.0 - p)).max(1e-16);
            }

            let mut tree = RegressionTree::fit(x, &grad, &hess, &tree_params);
            tree.scale_leaves(params.learning_rate);

            for i in 0..n {
                margins[i] += tree.predict_row(x.row(i));
            }
            trees.push(tree);

            if (round + 1) % 50 == 0 {
                debug!("boosting round {}/{}", round + 1, params.n_rounds);
            }
        }

        Ok(Self {
            params,
            trees,
            base_margin: 0.0,
            n_features: x.ncols(),
        })
    }

    /// Additive margin (log-odds) for a single row
    pub fn predict_margin_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.base_margin
            + self
                .trees
                .iter()
                .map(|tree| tree.predict_row(row))
                .sum::<f64>()
    }

    /// Positive-class probability for a single row
    pub fn predict_proba_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        sigmoid(self.predict_margin_row(row))
    }

    /// Positive-class probabilities for every row of a matrix
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array1<f64> {
        Array1::from_iter(x.rows().into_iter().map(|row| self.predict_proba_row(row)))
    }

    /// Total split gain per feature across the ensemble
    pub fn feature_importance(&self) -> Vec<f64> {
        let mut gains = vec![0.0f64; self.n_features];
        for tree in &self.trees {
            tree.accumulate_gains(&mut gains);
        }
        gains
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn base_margin(&self) -> f64 {
        self.base_margin
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn params(&self) -> &GbtParams {
        &self.params
    }
}
