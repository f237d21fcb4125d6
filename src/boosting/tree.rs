use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Node of a fitted regression tree, arena-indexed.
///
/// `cover` is the sum of instance hessians reaching the node; the
/// explainer relies on it to weight descent paths, so it is persisted with
/// the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    /// Split feature index (leaf: unused)
    pub feature: usize,

    /// Split threshold; rows with `x[feature] < threshold` go left
    pub threshold: f64,

    /// Left child index in the arena
    pub left: usize,

    /// Right child index in the arena
    pub right: usize,

    /// Leaf weight (internal nodes: 0)
    pub value: f64,

    /// Sum of hessians reaching this node
    pub cover: f64,

    /// Split gain (leaf: 0)
    pub gain: f64,

    /// Leaf marker
    pub is_leaf: bool,
}

/// Growth parameters for a single tree
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,

    /// L2 regularization on leaf weights
    pub lambda: f64,

    /// Minimum gain required to keep a split
    pub gamma: f64,

    /// Minimum hessian sum per child
    pub min_child_weight: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 5,
            lambda: 1.0,
            gamma: 0.0,
            min_child_weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Regression tree fitted to per-sample gradients and hessians with
/// second-order leaf weights, exact greedy split search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
    pub root: usize,
}

impl RegressionTree {
    /// Fit a tree to gradient/hessian pairs over the full feature matrix.
    pub fn fit(x: &Array2<f64>, grad: &[f64], hess: &[f64], params: &TreeParams) -> Self {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        let mut nodes = Vec::new();
        let root = build_node(&mut nodes, x, grad, hess, &indices, 0, params);
        Self { nodes, root }
    }

    /// Raw output for a single row
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = self.root;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf {
                return node.value;
            }
            idx = if row[node.feature] < node.threshold {
                node.left
            } else {
                node.right
            };
        }
    }

    /// Accumulate per-feature split gains into `out`
    pub fn accumulate_gains(&self, out: &mut [f64]) {
        for node in &self.nodes {
            if !node.is_leaf {
                out[node.feature] += node.gain;
            }
        }
    }

    /// Scale all leaf weights in place (applied once per boosting round)
    pub fn scale_leaves(&mut self, factor: f64) {
        for node in &mut self.nodes {
            if node.is_leaf {
                node.value *= factor;
            }
        }
    }

    /// Cover-weighted expectation of the tree output
    pub fn expected_value(&self) -> f64 {
        self.expectation(self.root)
    }

    fn expectation(&self, idx: usize) -> f64 {
        let node = &self.nodes[idx];
        if node.is_leaf {
            return node.value;
        }
        let left = &self.nodes[node.left];
        let right = &self.nodes[node.right];
        (left.cover * self.expectation(node.left) + right.cover * self.expectation(node.right))
            / node.cover
    }
}

fn build_node(
    nodes: &mut Vec<TreeNode>,
    x: &Array2<f64>,
    grad: &[f64],
    hess: &[f64],
    indices: &[usize],
    depth: usize,
    params: &TreeParams,
) -> usize {
    let g_sum: f64 = indices.iter().map(|&i| grad[i]).sum();
    let h_sum: f64 = indices.iter().map(|&i| hess[i]).sum();

    let split = if depth < params.max_depth && indices.len() >= 2 {
        best_split(x, grad, hess, indices, g_sum, h_sum, params)
    } else {
        None
    };

    match split {
        Some(split) => {
            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x[[i, split.feature]] < split.threshold);

            let node_id = nodes.len();
            nodes.push(TreeNode {
                feature: split.feature,
                threshold: split.threshold,
                left: 0,
                right: 0,
                value: 0.0,
                cover: h_sum,
                gain: split.gain,
                is_leaf: false,
            });

            let left = build_node(nodes, x, grad, hess, &left_idx, depth + 1, params);
            let right = build_node(nodes, x, grad, hess, &right_idx, depth + 1, params);
            nodes[node_id].left = left;
            nodes[node_id].right = right;
            node_id
        }
        None => {
            let node_id = nodes.len();
            nodes.push(TreeNode {
                feature: 0,
                threshold: 0.0,
                left: 0,
                right: 0,
                value: -g_sum / (h_sum + params.lambda),
                cover: h_sum,
                gain: 0.0,
                is_leaf: true,
            });
            node_id
        }
    }
}

/// Exact greedy search across features, parallelized per feature.
fn best_split(
    x: &Array2<f64>,
    grad: &[f64],
    hess: &[f64],
    indices: &[usize],
    g_sum: f64,
    h_sum: f64,
    params: &TreeParams,
) -> Option<Split> {
    let parent_score = g_sum * g_sum / (h_sum + params.lambda);

    (0..x.ncols())
        .into_par_iter()
        .filter_map(|feature| {
            let mut column: Vec<(f64, f64, f64)> = indices
                .iter()
                .map(|&i| (x[[i, feature]], grad[i], hess[i]))
                .collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut best: Option<Split> = None;
            let mut g_left = 0.0;
            let mut h_left = 0.0;

            for i in 0..column.len() - 1 {
                g_left += column[i].1;
                h_left += column[i].2;

                // no valid threshold between equal values
                if column[i + 1].0 == column[i].0 {
                    continue;
                }

                let h_right = h_sum - h_left;
                if h_left < params.min_child_weight || h_right < params.min_child_weight {
                    continue;
                }

                let g_right = g_sum - g_left;
                let gain = 0.5
                    * (g_left * g_left / (h_left + params.lambda)
                        + g_right * g_right / (h_right + params.lambda)
                        - parent_score)
                    - params.gamma;

                if gain > best.map_or(1e-12, |b| b.gain) {
                    best = Some(Split {
                        feature,
                        threshold: (column[i].0 + column[i + 1].0) / 2.0,
                        gain,
                    });
                }
            }
            best
        })
        .max_by(|a, b| a.gain.total_cmp(&b.gain))
}
