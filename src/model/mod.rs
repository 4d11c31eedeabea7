//! Regression model
//!
//! - `tree.rs` - Multi-output CART regression tree (flat node array)
//! - `ensemble.rs` - Gradient-boosted ensemble of multi-output trees
//! - `monotone.rs` - Per-feature, per-output monotone constraints
//! - `artifact.rs` - Versioned, fingerprinted model artifact (JSON)

pub mod tree;
pub mod ensemble;
pub mod monotone;
pub mod artifact;

use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

pub use artifact::{ModelArtifact, TrainingSummary, ARTIFACT_FORMAT_VERSION, MODEL_TYPE};
pub use ensemble::{BoostingParams, GradientBoostedEnsemble};
pub use monotone::{band_constraints, Monotone, MonotoneConstraint};
pub use tree::{RegressionTree, TreeNode};

/// health, growth, yield
pub const N_OUTPUTS: usize = 3;

/// Output names in ensemble order
pub const OUTPUT_NAMES: [&str; N_OUTPUTS] = ["health_score", "growth_score", "yield_score"];

/// Model scores, each clamped to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreTriple {
    pub health_score: f64,
    pub growth_score: f64,
    pub yield_score: f64,
}

impl ScoreTriple {
    /// Clamp raw ensemble output into [0, 1].
    ///
    /// Boosting can overshoot the target range slightly; that is clamped.
    /// A non-finite output is an inference failure.
    pub fn from_raw(raw: [f64; N_OUTPUTS]) -> Result<Self, InferenceError> {
        for (output, value) in OUTPUT_NAMES.iter().zip(raw) {
            if !value.is_finite() {
                return Err(InferenceError::NonFiniteOutput { output, value });
            }
        }

        Ok(Self {
            health_score: raw[0].clamp(0.0, 1.0),
            growth_score: raw[1].clamp(0.0, 1.0),
            yield_score: raw[2].clamp(0.0, 1.0),
        })
    }

    pub fn as_array(&self) -> [f64; N_OUTPUTS] {
        [self.health_score, self.growth_score, self.yield_score]
    }
}
