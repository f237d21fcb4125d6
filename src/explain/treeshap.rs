//! Exact Shapley-value attribution for tree ensembles.
//!
//! Path-dependent Tree SHAP (Lundberg et al.): for one input row, each
//! feature receives a signed contribution to the ensemble margin such that
//! the contributions plus the ensemble's expected value sum to the row's
//! margin. Exact, not sampled; tree structure makes the computation
//! polynomial in path depth.

use crate::boosting::{GradientBoostedTrees, RegressionTree};
use ndarray::ArrayView1;

/// One segment of the active decision path during traversal
#[derive(Debug, Clone, Copy)]
struct PathElement {
    /// Feature that split this segment; -1 for the root sentinel
    feature: i64,

    /// Fraction of cover flowing through when the feature is unknown
    zero_fraction: f64,

    /// 1 if the row satisfies the split, 0 on cold branches
    one_fraction: f64,

    /// Permutation weight accumulated for this segment
    pweight: f64,
}

/// Grow the path by one segment, redistributing permutation weights.
fn extend(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: i64) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        pweight: if depth == 0 { 1.0 } else { 0.0 },
    });

    let d = depth as f64;
    for i in (0..depth).rev() {
        path[i + 1].pweight += one_fraction * path[i].pweight * (i as f64 + 1.0) / (d + 1.0);
        path[i].pweight = zero_fraction * path[i].pweight * (d - i as f64) / (d + 1.0);
    }
}

/// Remove segment `index` from the path, undoing its weight contribution.
fn unwind(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let d = depth as f64;

    let mut next_one_portion = path[depth].pweight;
    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[i].pweight;
            path[i].pweight = next_one_portion * (d + 1.0) / ((i as f64 + 1.0) * one_fraction);
            next_one_portion = tmp - path[i].pweight * zero_fraction * (d - i as f64) / (d + 1.0);
        } else {
            path[i].pweight = path[i].pweight * (d + 1.0) / (zero_fraction * (d - i as f64));
        }
    }

    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

/// Total permutation weight the path would have without segment `index`.
fn unwound_path_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let d = depth as f64;

    let mut next_one_portion = path[depth].pweight;
    let mut total = 0.0;
    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = next_one_portion * (d + 1.0) / ((i as f64 + 1.0) * one_fraction);
            total += tmp;
            next_one_portion = path[i].pweight - tmp * zero_fraction * (d - i as f64) / (d + 1.0);
        } else {
            total += path[i].pweight * (d + 1.0) / (zero_fraction * (d - i as f64));
        }
    }
    total
}

fn recurse(
    tree: &RegressionTree,
    row: ArrayView1<'_, f64>,
    phi: &mut [f64],
    node_index: usize,
    parent_path: &[PathElement],
    parent_zero_fraction: f64,
    parent_one_fraction: f64,
    parent_feature: i64,
) {
    let mut path = parent_path.to_vec();
    extend(
        &mut path,
        parent_zero_fraction,
        parent_one_fraction,
        parent_feature,
    );

    let node = &tree.nodes[node_index];
    if node.is_leaf {
        for i in 1..path.len() {
            let weight = unwound_path_sum(&path, i);
            let element = &path[i];
            if element.feature >= 0 {
                phi[element.feature as usize] +=
                    weight * (element.one_fraction - element.zero_fraction) * node.value;
            }
        }
        return;
    }

    let (hot, cold) = if row[node.feature] < node.threshold {
        (node.left, node.right)
    } else {
        (node.right, node.left)
    };
    let hot_zero_fraction = tree.nodes[hot].cover / node.cover;
    let cold_zero_fraction = tree.nodes[cold].cover / node.cover;

    // undo any earlier split on the same feature before descending
    let mut incoming_zero_fraction = 1.0;
    let mut incoming_one_fraction = 1.0;
    if let Some(k) = path
        .iter()
        .position(|element| element.feature == node.feature as i64)
    {
        incoming_zero_fraction = path[k].zero_fraction;
        incoming_one_fraction = path[k].one_fraction;
        unwind(&mut path, k);
    }

    recurse(
        tree,
        row,
        phi,
        hot,
        &path,
        hot_zero_fraction * incoming_zero_fraction,
        incoming_one_fraction,
        node.feature as i64,
    );
    recurse(
        tree,
        row,
        phi,
        cold,
        &path,
        cold_zero_fraction * incoming_zero_fraction,
        0.0,
        node.feature as i64,
    );
}

/// Per-feature attributions for one tree, accumulated into `phi`.
pub fn tree_shap(tree: &RegressionTree, row: ArrayView1<'_, f64>, phi: &mut [f64]) {
    recurse(tree, row, phi, tree.root, &[], 1.0, 1.0, -1);
}

/// Per-feature attributions to the ensemble margin for one input row.
///
/// Returns `None` when the row width does not match the fitted feature
/// count; attribution is best-effort and the caller degrades gracefully.
pub fn shap_values(model: &GradientBoostedTrees, row: ArrayView1<'_, f64>) -> Option<Vec<f64>> {
    if row.len() != model.n_features() {
        return None;
    }

    let mut phi = vec![0.0f64; model.n_features()];
    for tree in model.trees() {
        tree_shap(tree, row, &mut phi);
    }
    Some(phi)
}

/// Expected margin of the ensemble over its training distribution
pub fn expected_margin(model: &GradientBoostedTrees) -> f64 {
    model.base_margin()
        + model
            .trees()
            .iter()
            .map(|tree| tree.expected_value())
            .sum::<f64>()
}
