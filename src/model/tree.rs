//! Multi-Output Regression Tree
//!
//! CART tree whose leaves carry one value per model output, so a single
//! traversal yields health, growth and yield contributions together.
//!
//! Nodes are stored in a flat array. The root is node 0 and every child index
//! is strictly greater than its parent's, which `validate` checks on load so a
//! traversal of a loaded tree always terminates.
//!
//! ## Split criterion
//! Squared-error reduction summed over all outputs:
//! `Σ_o (S_L,o² / n_L + S_R,o² / n_R - S_o² / n)` where `S` are residual sums.
//! Feature candidates are searched in parallel; ties resolve to the lower
//! feature index so training is deterministic.
//!
//! ## Monotone constraints
//! Each node carries a `[lower, upper]` bound per output. Leaf means are
//! clamped into it, a constrained split whose clamped child means run the
//! wrong way is skipped, and an accepted one hands the midpoint of its child
//! means to the children as their new upper or lower bound.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::monotone::ConstraintTable;
use super::N_OUTPUTS;
use crate::features::N_FEATURES;

/// Tree node (flat-array representation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Samples with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Shrunk contribution per output
    Leaf { values: [f64; N_OUTPUTS] },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    pub fn from_nodes(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Leaf reached by `x`
    pub fn leaf_values(&self, x: &[f64; N_FEATURES]) -> &[f64; N_OUTPUTS] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { values } => return values,
                TreeNode::Split { feature, threshold, left, right } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Depth of the tree (a single leaf has depth 0)
    pub fn depth(&self) -> usize {
        fn node_depth(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => {
                    1 + node_depth(nodes, *left).max(node_depth(nodes, *right))
                }
            }
        }
        if self.nodes.is_empty() { 0 } else { node_depth(&self.nodes, 0) }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    /// Structural invariants required for safe traversal
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        let n = self.nodes.len();
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split { feature, threshold, left, right } => {
                    if *feature >= n_features {
                        return Err(format!("node {} splits on unknown feature {}", id, feature));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", id));
                    }
                    for child in [*left, *right] {
                        if child <= id || child >= n {
                            return Err(format!("node {} has invalid child index {}", id, child));
                        }
                    }
                }
                TreeNode::Leaf { values } => {
                    if values.iter().any(|v| !v.is_finite()) {
                        return Err(format!("leaf {} has a non-finite value", id));
                    }
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tree Growing
// ============================================================================

/// Per-tree growth limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Minimum squared-error reduction to accept a split
    pub min_gain: f64,
    pub monotone: ConstraintTable,
}

/// Allowed leaf range per output, before shrinkage
type Bounds = [(f64, f64); N_OUTPUTS];

const OPEN_BOUNDS: Bounds = [(f64::NEG_INFINITY, f64::INFINITY); N_OUTPUTS];

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Fits one tree to the current residuals
pub(crate) struct TreeBuilder<'a> {
    pub x: &'a [[f64; N_FEATURES]],
    pub residuals: &'a [[f64; N_OUTPUTS]],
    pub params: TreeParams,
    /// Learning rate baked into leaf values
    pub shrinkage: f64,
}

impl<'a> TreeBuilder<'a> {
    pub fn build(&self, indices: Vec<usize>) -> RegressionTree {
        let mut nodes = Vec::new();
        self.grow(indices, 0, &OPEN_BOUNDS, &mut nodes);
        RegressionTree { nodes }
    }

    fn grow(
        &self,
        indices: Vec<usize>,
        depth: usize,
        bounds: &Bounds,
        nodes: &mut Vec<TreeNode>,
    ) -> usize {
        let id = nodes.len();
        nodes.push(self.leaf(&indices, bounds));

        let min_leaf = self.params.min_samples_leaf.max(1);
        if depth >= self.params.max_depth || indices.len() < 2 * min_leaf {
            return id;
        }

        let Some(split) = self.best_split(&indices, bounds) else {
            return id;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.x[i][split.feature] <= split.threshold);

        if left_idx.is_empty() || right_idx.is_empty() {
            return id;
        }

        let (left_bounds, right_bounds) = self.child_bounds(&split, &left_idx, &right_idx, bounds);
        let left = self.grow(left_idx, depth + 1, &left_bounds, nodes);
        let right = self.grow(right_idx, depth + 1, &right_bounds, nodes);
        nodes[id] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    /// Mean residual per output, clamped into `bounds`
    fn bounded_mean(&self, indices: &[usize], bounds: &Bounds) -> [f64; N_OUTPUTS] {
        let mut values = [0.0; N_OUTPUTS];
        if indices.is_empty() {
            return values;
        }
        for &i in indices {
            for (v, r) in values.iter_mut().zip(self.residuals[i].iter()) {
                *v += r;
            }
        }
        let n = indices.len() as f64;
        for (v, (lo, hi)) in values.iter_mut().zip(bounds.iter()) {
            *v = (*v / n).clamp(*lo, *hi);
        }
        values
    }

    /// Bounded mean shrunk by the learning rate
    fn leaf(&self, indices: &[usize], bounds: &Bounds) -> TreeNode {
        let mut values = self.bounded_mean(indices, bounds);
        for v in values.iter_mut() {
            *v *= self.shrinkage;
        }
        TreeNode::Leaf { values }
    }

    /// Tighten bounds for the children of an accepted split
    fn child_bounds(
        &self,
        split: &SplitCandidate,
        left_idx: &[usize],
        right_idx: &[usize],
        bounds: &Bounds,
    ) -> (Bounds, Bounds) {
        let mut left_bounds = *bounds;
        let mut right_bounds = *bounds;
        let left_mean = self.bounded_mean(left_idx, bounds);
        let right_mean = self.bounded_mean(right_idx, bounds);

        for o in 0..N_OUTPUTS {
            let Some(shape) = self.params.monotone[split.feature][o] else {
                continue;
            };
            let mid = (left_mean[o] + right_mean[o]) * 0.5;
            if shape.rising_at(split.threshold) {
                left_bounds[o].1 = mid;
                right_bounds[o].0 = mid;
            } else {
                left_bounds[o].0 = mid;
                right_bounds[o].1 = mid;
            }
        }
        (left_bounds, right_bounds)
    }

    fn best_split(&self, indices: &[usize], bounds: &Bounds) -> Option<SplitCandidate> {
        let mut totals = [0.0; N_OUTPUTS];
        for &i in indices {
            for (t, r) in totals.iter_mut().zip(self.residuals[i].iter()) {
                *t += r;
            }
        }

        let per_feature: Vec<Option<SplitCandidate>> = (0..N_FEATURES)
            .into_par_iter()
            .map(|feature| self.best_split_for_feature(feature, indices, &totals, bounds))
            .collect();

        // Sequential reduction in feature order: strict improvement required,
        // so ties keep the lower feature index
        per_feature
            .into_iter()
            .flatten()
            .fold(None, |best: Option<SplitCandidate>, candidate| match best {
                Some(b) if b.gain >= candidate.gain => Some(b),
                _ => Some(candidate),
            })
    }

    fn best_split_for_feature(
        &self,
        feature: usize,
        indices: &[usize],
        totals: &[f64; N_OUTPUTS],
        bounds: &Bounds,
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        if n < 2 {
            return None;
        }

        let mut order = indices.to_vec();
        order.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent_score: f64 = totals.iter().map(|s| s * s / n as f64).sum();
        let constraints = &self.params.monotone[feature];

        let mut left_sum = [0.0; N_OUTPUTS];
        let mut best: Option<SplitCandidate> = None;

        for pos in 0..n - 1 {
            let i = order[pos];
            for (l, r) in left_sum.iter_mut().zip(self.residuals[i].iter()) {
                *l += r;
            }

            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < min_leaf {
                continue;
            }
            if n_right < min_leaf {
                break;
            }

            let value = self.x[i][feature];
            let next = self.x[order[pos + 1]][feature];
            if next <= value {
                // Identical values cannot be separated
                continue;
            }

            let mut score = 0.0;
            for o in 0..N_OUTPUTS {
                let right_sum = totals[o] - left_sum[o];
                score += left_sum[o] * left_sum[o] / n_left as f64
                    + right_sum * right_sum / n_right as f64;
            }
            let gain = score - parent_score;
            if gain <= self.params.min_gain || best.map_or(false, |b| gain <= b.gain) {
                continue;
            }

            let mut threshold = value + (next - value) * 0.5;
            if threshold >= next {
                threshold = value;
            }

            let ordered = (0..N_OUTPUTS).all(|o| {
                let Some(shape) = constraints[o] else {
                    return true;
                };
                let (lo, hi) = bounds[o];
                let left_mean = (left_sum[o] / n_left as f64).clamp(lo, hi);
                let right_mean = ((totals[o] - left_sum[o]) / n_right as f64).clamp(lo, hi);
                if shape.rising_at(threshold) {
                    left_mean <= right_mean
                } else {
                    left_mean >= right_mean
                }
            });
            if ordered {
                best = Some(SplitCandidate { feature, threshold, gain });
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::monotone::{Monotone, UNCONSTRAINED};
    use approx::assert_relative_eq;

    fn params(max_depth: usize) -> TreeParams {
        TreeParams {
            max_depth,
            min_samples_leaf: 1,
            min_gain: 1e-12,
            monotone: UNCONSTRAINED,
        }
    }

    fn row(first: f64) -> [f64; N_FEATURES] {
        [first, 0.0, 0.0, 0.0, 0.0]
    }

    #[test]
    fn test_stump_separates_step_function() {
        let x = vec![row(1.0), row(2.0), row(3.0), row(4.0)];
        let r = vec![[0.0, 1.0, 2.0], [0.0, 1.0, 2.0], [1.0, 0.0, 4.0], [1.0, 0.0, 4.0]];
        let builder = TreeBuilder { x: &x, residuals: &r, params: params(1), shrinkage: 1.0 };
        let tree = builder.build((0..4).collect());

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
        match &tree.nodes()[0] {
            TreeNode::Split { feature, threshold, .. } => {
                assert_eq!(*feature, 0);
                assert_relative_eq!(*threshold, 2.5, epsilon = 1e-12);
            }
            other => panic!("expected split at root, got {:?}", other),
        }
        assert_eq!(tree.leaf_values(&row(1.5)), &[0.0, 1.0, 2.0]);
        assert_eq!(tree.leaf_values(&row(3.5)), &[1.0, 0.0, 4.0]);
        assert!(tree.validate(N_FEATURES).is_ok());
    }

    #[test]
    fn test_shrinkage_applied_to_leaves() {
        let x = vec![row(1.0), row(1.0)];
        let r = vec![[2.0, 4.0, 6.0], [2.0, 4.0, 6.0]];
        let builder = TreeBuilder { x: &x, residuals: &r, params: params(3), shrinkage: 0.1 };
        let tree = builder.build(vec![0, 1]);

        // Identical rows: no split possible
        assert_eq!(tree.nodes().len(), 1);
        let v = tree.leaf_values(&row(1.0));
        assert_relative_eq!(v[0], 0.2, epsilon = 1e-12);
        assert_relative_eq!(v[2], 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_min_samples_leaf_blocks_small_children() {
        let x = vec![row(1.0), row(2.0), row(3.0), row(4.0)];
        let r = vec![[10.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
        let p = TreeParams { max_depth: 2, min_samples_leaf: 2, ..params(2) };
        let builder = TreeBuilder { x: &x, residuals: &r, params: p, shrinkage: 1.0 };
        let tree = builder.build((0..4).collect());

        match &tree.nodes()[0] {
            TreeNode::Split { threshold, .. } => assert_relative_eq!(*threshold, 2.5, epsilon = 1e-12),
            other => panic!("expected split, got {:?}", other),
        }
        assert_eq!(tree.depth(), 1);
    }

    /// Rising trend with a zig-zag on top; the second feature shifts the level
    fn zigzag() -> (Vec<[f64; N_FEATURES]>, Vec<[f64; N_OUTPUTS]>) {
        let wobble = [0.0, 0.8, -0.6, 0.5, -0.7, 0.6, -0.4, 0.0];
        let mut x = Vec::new();
        let mut r = Vec::new();
        for b in [0.0, 1.0] {
            for (i, w) in wobble.iter().enumerate() {
                let a = (i + 1) as f64;
                x.push([a, b, 0.0, 0.0, 0.0]);
                r.push([a * 0.5 + b + w, -a * 0.5 - w, *w]);
            }
        }
        (x, r)
    }

    fn sweep(tree: &RegressionTree, b: f64, output: usize) -> Vec<f64> {
        (0..=36)
            .map(|k| tree.leaf_values(&[0.5 + k as f64 * 0.25, b, 0.0, 0.0, 0.0])[output])
            .collect()
    }

    #[test]
    fn test_monotone_constraint_holds_through_deeper_splits() {
        let (x, r) = zigzag();
        let mut p = params(4);
        p.monotone[0][0] = Some(Monotone::Increasing);
        p.monotone[0][1] = Some(Monotone::Decreasing);
        let builder = TreeBuilder { x: &x, residuals: &r, params: p, shrinkage: 1.0 };
        let tree = builder.build((0..x.len()).collect());

        assert!(tree.n_leaves() > 1);
        for b in [0.0, 1.0] {
            let rising = sweep(&tree, b, 0);
            assert!(rising.windows(2).all(|w| w[1] >= w[0]), "output 0: {:?}", rising);
            let falling = sweep(&tree, b, 1);
            assert!(falling.windows(2).all(|w| w[1] <= w[0]), "output 1: {:?}", falling);
        }
    }

    #[test]
    fn test_peaked_constraint_rises_then_falls() {
        let wobble = [0.3, -0.3, 0.3, -0.3, 0.3, -0.3, 0.3, -0.3, 0.3, -0.3];
        let x: Vec<[f64; N_FEATURES]> = (0..10).map(|i| [i as f64, 0.0, 0.0, 0.0, 0.0]).collect();
        let r: Vec<[f64; N_OUTPUTS]> = (0..10)
            .map(|i| [2.0 - (i as f64 - 4.5).abs() * 0.4 + wobble[i], 0.0, 0.0])
            .collect();

        let mut p = params(4);
        p.monotone[0][0] = Some(Monotone::Peaked(4.5));
        let builder = TreeBuilder { x: &x, residuals: &r, params: p, shrinkage: 1.0 };
        let tree = builder.build((0..10).collect());

        let at = |a: f64| tree.leaf_values(&[a, 0.0, 0.0, 0.0, 0.0])[0];
        let grid: Vec<f64> = (0..=40).map(|k| k as f64 * 0.225).collect();
        for w in grid.windows(2) {
            if w[1] <= 4.5 {
                assert!(at(w[1]) >= at(w[0]), "fell before peak at {}", w[1]);
            } else if w[0] >= 4.5 {
                assert!(at(w[1]) <= at(w[0]), "rose after peak at {}", w[1]);
            }
        }
    }

    #[test]
    fn test_validate_rejects_backward_child() {
        let tree = RegressionTree::from_nodes(vec![
            TreeNode::Split { feature: 0, threshold: 1.0, left: 0, right: 1 },
            TreeNode::Leaf { values: [0.0; N_OUTPUTS] },
        ]);
        assert!(tree.validate(N_FEATURES).is_err());

        let bad_feature = RegressionTree::from_nodes(vec![
            TreeNode::Split { feature: 9, threshold: 1.0, left: 1, right: 2 },
            TreeNode::Leaf { values: [0.0; N_OUTPUTS] },
            TreeNode::Leaf { values: [0.0; N_OUTPUTS] },
        ]);
        assert!(bad_feature.validate(N_FEATURES).is_err());

        assert!(RegressionTree::from_nodes(vec![]).validate(N_FEATURES).is_err());
    }

    #[test]
    fn test_node_serde_shape() {
        let leaf = TreeNode::Leaf { values: [0.5, 0.25, 0.0] };
        let json = serde_json::to_string(&leaf).unwrap();
        assert_eq!(json, r#"{"kind":"leaf","values":[0.5,0.25,0.0]}"#);
    }
}
