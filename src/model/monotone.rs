//! Monotone Constraints
//!
//! A constraint ties one output to one feature. The output may only rise with
//! the feature (`Increasing`), only fall (`Decreasing`), or rise up to a peak
//! and fall after it (`Peaked`). Values are in the units of the rows the
//! ensemble is fitted on, so the trainer rescales configured peaks with the
//! fitted scaler before boosting.
//!
//! Tree growth enforces constraints as XGBoost does: a split on a constrained
//! feature must order its child values in the required direction, and the
//! midpoint between them becomes the bound for both subtrees. Every tree is
//! then monotone in that feature, and so is their sum.

use serde::{Deserialize, Serialize};

use super::N_OUTPUTS;
use crate::features::{FeatureScaler, N_FEATURES};
use crate::parameters::Parameter;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Monotone {
    Increasing,
    Decreasing,
    /// Non-decreasing below the peak, non-increasing from it on
    Peaked(f64),
}

impl Monotone {
    /// Whether the right child (`x > threshold`) must not fall below the left one
    pub fn rising_at(self, threshold: f64) -> bool {
        match self {
            Monotone::Increasing => true,
            Monotone::Decreasing => false,
            Monotone::Peaked(peak) => threshold < peak,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonotoneConstraint {
    pub feature: usize,
    pub output: usize,
    pub shape: Monotone,
}

/// Constraint lookup by `[feature][output]`
pub type ConstraintTable = [[Option<Monotone>; N_OUTPUTS]; N_FEATURES];

pub const UNCONSTRAINED: ConstraintTable = [[None; N_OUTPUTS]; N_FEATURES];

impl MonotoneConstraint {
    pub fn validate(&self) -> Result<(), String> {
        if self.feature >= N_FEATURES {
            return Err(format!("monotone constraint on unknown feature {}", self.feature));
        }
        if self.output >= N_OUTPUTS {
            return Err(format!("monotone constraint on unknown output {}", self.output));
        }
        if let Monotone::Peaked(peak) = self.shape {
            if !peak.is_finite() {
                return Err(format!("monotone peak for feature {} is not finite", self.feature));
            }
        }
        Ok(())
    }

    /// Same constraint with its peak moved into scaled feature space
    pub fn scaled(&self, scaler: &FeatureScaler) -> Self {
        let shape = match self.shape {
            Monotone::Peaked(peak) => Monotone::Peaked(scaler.scale_value(self.feature, peak)),
            other => other,
        };
        Self { shape, ..*self }
    }
}

/// Validate `constraints` and index them; a repeated feature/output pair is an error
pub fn constraint_table(constraints: &[MonotoneConstraint]) -> Result<ConstraintTable, String> {
    let mut table = UNCONSTRAINED;
    for c in constraints {
        c.validate()?;
        let slot = &mut table[c.feature][c.output];
        if slot.is_some() {
            return Err(format!(
                "duplicate monotone constraint for feature {} output {}",
                c.feature, c.output
            ));
        }
        *slot = Some(c.shape);
    }
    Ok(table)
}

/// Every output peaks at the midpoint of each parameter's optimal band
pub fn band_constraints() -> Vec<MonotoneConstraint> {
    Parameter::ALL
        .iter()
        .flat_map(|p| {
            let peak = p.spec().optimal.midpoint();
            (0..N_OUTPUTS).map(move |output| MonotoneConstraint {
                feature: p.index(),
                output,
                shape: Monotone::Peaked(peak),
            })
        })
        .collect()
}
