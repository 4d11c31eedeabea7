//! Error Taxonomy
//!
//! - `ValidationError`: caller-fixable input problems (bad range, unknown label)
//! - `ArtifactLoadError`: operator-fixable model file problems, fatal at startup
//! - `InferenceError`: numeric failure inside the ensemble, never retried
//!
//! Training, CSV loading and artifact saving use `anyhow` with context instead.

use std::path::PathBuf;

/// Invalid prediction input
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} = {value} is outside the accepted range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("unknown {field} '{value}' (expected one of: {expected})")]
    UnknownCategory {
        field: &'static str,
        value: String,
        expected: String,
    },
}

impl ValidationError {
    /// Offending request field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::OutOfRange { field, .. } => field,
            ValidationError::UnknownCategory { field, .. } => field,
        }
    }
}

/// Model artifact could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum ArtifactLoadError {
    #[error("failed to read model artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported artifact format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("model artifact fingerprint mismatch: expected {expected}, computed {actual}")]
    FingerprintMismatch { expected: String, actual: String },

    #[error("invalid model artifact: {0}")]
    InvalidStructure(String),
}

/// Unexpected numeric failure while evaluating the model
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("ensemble produced a non-finite {output} ({value})")]
    NonFiniteOutput { output: &'static str, value: f64 },
}

/// Anything that can stop a single prediction
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("no model artifact is loaded")]
    ModelUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field_and_bounds() {
        let err = ValidationError::OutOfRange {
            field: "ph_value",
            value: 9.5,
            min: 3.0,
            max: 9.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("ph_value"));
        assert!(msg.contains("9.5"));
        assert!(msg.contains("[3, 9]"));
        assert_eq!(err.field(), "ph_value");
    }

    #[test]
    fn test_predict_error_is_transparent() {
        let err: PredictError = ValidationError::UnknownCategory {
            field: "visual_condition",
            value: "Purple".to_string(),
            expected: "Healthy".to_string(),
        }
        .into();
        assert!(err.to_string().starts_with("unknown visual_condition 'Purple'"));
    }
}
