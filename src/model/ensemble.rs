//! Gradient-Boosted Ensemble
//!
//! Squared-loss boosting over multi-output trees. The base score is the
//! per-output target mean; each round fits one tree to the residuals of all
//! three outputs at once. Leaf values already include the learning rate, so
//! prediction is `base_score + Σ tree.leaf_values(x)`.
//!
//! Monotone constraints given to [`GradientBoostedEnsemble::fit`] hold for
//! every tree and are stored with the ensemble.

use anyhow::{anyhow, ensure, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::monotone::{constraint_table, ConstraintTable, MonotoneConstraint};
use super::tree::{RegressionTree, TreeBuilder, TreeParams};
use super::N_OUTPUTS;
use crate::features::N_FEATURES;

/// Booster hyper-parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub min_gain: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 120,
            learning_rate: 0.1,
            max_depth: 4,
            min_samples_leaf: 5,
            min_gain: 1e-9,
        }
    }
}

impl BoostingParams {
    fn tree_params(&self, monotone: ConstraintTable) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
            min_gain: self.min_gain,
            monotone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedEnsemble {
    pub n_features: usize,
    pub base_score: [f64; N_OUTPUTS],
    pub learning_rate: f64,
    /// In scaled feature units
    #[serde(default)]
    pub monotone_constraints: Vec<MonotoneConstraint>,
    pub trees: Vec<RegressionTree>,
}

impl GradientBoostedEnsemble {
    /// Fit on normalized rows `x` against targets `y`.
    ///
    /// `constraints` are expressed in the units of `x`.
    pub fn fit(
        x: &[[f64; N_FEATURES]],
        y: &[[f64; N_OUTPUTS]],
        params: &BoostingParams,
        constraints: &[MonotoneConstraint],
    ) -> Result<Self> {
        ensure!(!x.is_empty(), "cannot fit an ensemble on zero rows");
        ensure!(
            x.len() == y.len(),
            "feature rows ({}) and target rows ({}) differ",
            x.len(),
            y.len()
        );
        ensure!(params.n_estimators > 0, "n_estimators must be at least 1");
        ensure!(
            params.learning_rate > 0.0 && params.learning_rate <= 1.0,
            "learning_rate must be in (0, 1], got {}",
            params.learning_rate
        );
        ensure!(
            x.iter().flatten().chain(y.iter().flatten()).all(|v| v.is_finite()),
            "training data contains non-finite values"
        );
        let monotone = constraint_table(constraints).map_err(|e| anyhow!(e))?;

        let n = x.len();
        let mut base_score = [0.0; N_OUTPUTS];
        for row in y {
            for (b, t) in base_score.iter_mut().zip(row.iter()) {
                *b += t;
            }
        }
        for b in base_score.iter_mut() {
            *b /= n as f64;
        }

        info!(
            rows = n,
            trees = params.n_estimators,
            max_depth = params.max_depth,
            learning_rate = params.learning_rate,
            constraints = constraints.len(),
            "Fitting gradient-boosted ensemble"
        );

        let mut predictions = vec![base_score; n];
        let mut residuals = vec![[0.0; N_OUTPUTS]; n];
        let mut trees = Vec::with_capacity(params.n_estimators);
        let tree_params = params.tree_params(monotone);

        for round in 0..params.n_estimators {
            residuals
                .par_iter_mut()
                .zip(predictions.par_iter())
                .zip(y.par_iter())
                .for_each(|((r, p), t)| {
                    for o in 0..N_OUTPUTS {
                        r[o] = t[o] - p[o];
                    }
                });

            let builder = TreeBuilder {
                x,
                residuals: &residuals,
                params: tree_params,
                shrinkage: params.learning_rate,
            };
            let tree = builder.build((0..n).collect());

            predictions
                .par_iter_mut()
                .zip(x.par_iter())
                .for_each(|(p, row)| {
                    let leaf = tree.leaf_values(row);
                    for o in 0..N_OUTPUTS {
                        p[o] += leaf[o];
                    }
                });

            if (round + 1) % 20 == 0 {
                let mse: f64 = residuals
                    .iter()
                    .map(|r| r.iter().map(|v| v * v).sum::<f64>())
                    .sum::<f64>()
                    / (n * N_OUTPUTS) as f64;
                debug!(round = round + 1, mse, leaves = tree.n_leaves(), "Boosting progress");
            }

            trees.push(tree);
        }

        Ok(Self {
            n_features: N_FEATURES,
            base_score,
            learning_rate: params.learning_rate,
            monotone_constraints: constraints.to_vec(),
            trees,
        })
    }

    /// Unclamped prediction for one normalized row
    pub fn predict_raw(&self, x: &[f64; N_FEATURES]) -> [f64; N_OUTPUTS] {
        let mut out = self.base_score;
        for tree in &self.trees {
            let leaf = tree.leaf_values(x);
            for o in 0..N_OUTPUTS {
                out[o] += leaf[o];
            }
        }
        out
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(|t| t.depth()).max().unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.n_features != N_FEATURES {
            return Err(format!(
                "ensemble expects {} features, engine provides {}",
                self.n_features, N_FEATURES
            ));
        }
        if self.trees.is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        if self.base_score.iter().any(|v| !v.is_finite()) {
            return Err("ensemble base score is not finite".to_string());
        }
        constraint_table(&self.monotone_constraints)?;
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }
}
