//! Depth-limited regression tree fit to boosting residuals.

use ndarray::{Array2, ArrayView1};

/// One node in the flat tree layout. `feature < 0` marks a leaf.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub feature: i32,
    pub threshold: f32,
    pub left: i32,
    pub right: i32,
    pub value: f32,
}

/// A regression tree stored as a flat node vector, root at index 0.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Fit a tree to `targets` over the given rows, considering only the
    /// given feature columns for splits.
    pub fn fit(
        x: &Array2<f32>,
        targets: &[f32],
        rows: &[usize],
        features: &[usize],
        max_depth: usize,
        min_samples_leaf: usize,
    ) -> RegressionTree {
        let mut tree = RegressionTree { nodes: Vec::new() };
        let mut rows = rows.to_vec();
        let n = rows.len();
        tree.build(x, targets, &mut rows, 0, n, features, max_depth, min_samples_leaf);
        tree
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Walk the tree for one sample row.
    pub fn predict_row(&self, row: ArrayView1<f32>) -> f32 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.feature < 0 {
                return node.value;
            }
            let v = row[node.feature as usize];
            idx = if v <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }

    /// Recursively grow the subtree over `rows[start..end]`, returning the
    /// new node's index. The row slice is partitioned in place.
    #[allow(clippy::too_many_arguments)]
    fn build(
        &mut self,
        x: &Array2<f32>,
        targets: &[f32],
        rows: &mut Vec<usize>,
        start: usize,
        end: usize,
        features: &[usize],
        depth_left: usize,
        min_samples_leaf: usize,
    ) -> i32 {
        let count = end - start;
        let mean = rows[start..end]
            .iter()
            .map(|&r| targets[r] as f64)
            .sum::<f64>()
            / count as f64;

        let split = if depth_left == 0 || count < 2 * min_samples_leaf {
            None
        } else {
            best_split(x, targets, &rows[start..end], features, min_samples_leaf)
        };

        let node_idx = self.nodes.len() as i32;
        self.nodes.push(TreeNode {
            feature: -1,
            threshold: 0.0,
            left: -1,
            right: -1,
            value: mean as f32,
        });

        if let Some(split) = split {
            let mid = partition_rows(x, rows, start, end, split.feature, split.threshold);
            // Equal feature values can defeat the partition; keep the leaf then.
            if mid > start && mid < end {
                let left = self.build(
                    x,
                    targets,
                    rows,
                    start,
                    mid,
                    features,
                    depth_left - 1,
                    min_samples_leaf,
                );
                let right = self.build(
                    x,
                    targets,
                    rows,
                    mid,
                    end,
                    features,
                    depth_left - 1,
                    min_samples_leaf,
                );
                let node = &mut self.nodes[node_idx as usize];
                node.feature = split.feature as i32;
                node.threshold = split.threshold;
                node.left = left;
                node.right = right;
            }
        }

        node_idx
    }
}

struct Split {
    feature: usize,
    threshold: f32,
    gain: f64,
}

/// Exact variance-gain split search over the candidate features.
fn best_split(
    x: &Array2<f32>,
    targets: &[f32],
    rows: &[usize],
    features: &[usize],
    min_samples_leaf: usize,
) -> Option<Split> {
    let n = rows.len();
    let total: f64 = rows.iter().map(|&r| targets[r] as f64).sum();
    let base = total * total / n as f64;

    let mut best: Option<Split> = None;
    let mut pairs: Vec<(f32, f64)> = Vec::with_capacity(n);

    for &feature in features {
        pairs.clear();
        pairs.extend(
            rows.iter()
                .map(|&r| (x[(r, feature)], targets[r] as f64)),
        );
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_sum = 0f64;
        for i in 0..n - 1 {
            left_sum += pairs[i].1;
            let n_left = i + 1;
            let n_right = n - n_left;
            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }
            // No split between identical values.
            if pairs[i].0 >= pairs[i + 1].0 {
                continue;
            }
            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / n_left as f64
                + right_sum * right_sum / n_right as f64
                - base;
            if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(Split {
                    feature,
                    threshold: pairs[i].0,
                    gain,
                });
            }
        }
    }
    best
}

/// Partition `rows[start..end]` so rows with value <= threshold come first.
/// Returns the index of the first right-side row.
fn partition_rows(
    x: &Array2<f32>,
    rows: &mut [usize],
    start: usize,
    end: usize,
    feature: usize,
    threshold: f32,
) -> usize {
    let mut mid = start;
    for i in start..end {
        if x[(rows[i], feature)] <= threshold {
            rows.swap(i, mid);
            mid += 1;
        }
    }
    mid
}
