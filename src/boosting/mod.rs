//! Gradient-boosted decision trees for binary classification.
//!
//! Second-order boosting with logistic loss and class-imbalance
//! compensation via positive-instance weighting. Tree internals (structure,
//! thresholds, hessian covers) are exposed so the explainer can compute
//! exact attributions against the fitted ensemble.

pub mod gbt;
pub mod tree;

pub use gbt::{GbtParams, GradientBoostedTrees};
pub use tree::{RegressionTree, TreeNode, TreeParams};
