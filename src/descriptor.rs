//! Model descriptor served by `/model-info`

use serde::{Deserialize, Serialize};

use crate::features::FEATURE_NAMES;
use crate::model::{ModelArtifact, MODEL_TYPE, OUTPUT_NAMES};
use crate::parameters::PARAMETERS;

/// One numeric input feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    pub name: String,
    pub field: String,
    pub unit: String,
    pub min: f64,
    pub max: f64,
    pub optimal_min: f64,
    pub optimal_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub model_type: String,
    pub model_version: String,
    pub format_version: u32,
    pub trained_at: String,
    pub n_trees: usize,
    /// Model input order, including the encoded visual condition
    pub feature_order: Vec<String>,
    pub features: Vec<FeatureDescriptor>,
    pub visual_conditions: Vec<String>,
    pub outputs: Vec<String>,
}

impl ModelDescriptor {
    pub fn from_artifact(artifact: &ModelArtifact) -> Self {
        let features = PARAMETERS
            .iter()
            .map(|spec| FeatureDescriptor {
                name: spec.label.to_string(),
                field: spec.field.to_string(),
                unit: spec.unit.trim().to_string(),
                min: spec.domain.min,
                max: spec.domain.max,
                optimal_min: spec.optimal.min,
                optimal_max: spec.optimal.max,
            })
            .collect();

        Self {
            model_type: MODEL_TYPE.to_string(),
            model_version: artifact.model_version.clone(),
            format_version: artifact.format_version,
            trained_at: artifact.trained_at.to_rfc3339(),
            n_trees: artifact.ensemble.n_trees(),
            feature_order: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            features,
            visual_conditions: artifact.categories.labels().to_vec(),
            outputs: OUTPUT_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}
