//! Model Artifact
//!
//! Everything inference needs, in one versioned JSON document: the category
//! table, the fitted scaler and the boosted ensemble, plus a training summary.
//!
//! A blake3 fingerprint over categories, scaler and ensemble is computed when
//! the artifact is sealed and checked again on load. Floats are written with
//! `float_roundtrip`, so a save/load cycle reproduces every bit of the model.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ensemble::{BoostingParams, GradientBoostedEnsemble};
use super::ScoreTriple;
use crate::error::{ArtifactLoadError, InferenceError};
use crate::features::{CategoryTable, FeatureScaler, FeatureVector};
use crate::training::EvaluationReport;

/// Layout version written by this build
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

pub const MODEL_TYPE: &str = "Multi-output gradient-boosted regression trees";

/// How the model was trained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// "synthetic" or the CSV path
    pub source: String,
    pub seed: u64,
    pub n_samples: usize,
    pub n_train: usize,
    pub n_holdout: usize,
    pub params: BoostingParams,
    pub evaluation: Option<EvaluationReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model_version: String,
    pub trained_at: DateTime<Utc>,
    pub categories: CategoryTable,
    pub scaler: FeatureScaler,
    pub ensemble: GradientBoostedEnsemble,
    pub training: TrainingSummary,
    pub fingerprint: String,
}

/// The fingerprinted subset of the artifact
#[derive(Serialize)]
struct SealedContent<'a> {
    categories: &'a CategoryTable,
    scaler: &'a FeatureScaler,
    ensemble: &'a GradientBoostedEnsemble,
}

#[derive(Deserialize)]
struct VersionProbe {
    format_version: u32,
}

impl ModelArtifact {
    /// Seal a freshly trained model: stamp `trained_at` and compute the fingerprint
    pub fn seal(
        model_version: impl Into<String>,
        categories: CategoryTable,
        scaler: FeatureScaler,
        ensemble: GradientBoostedEnsemble,
        training: TrainingSummary,
    ) -> Result<Self, serde_json::Error> {
        let mut artifact = Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_version: model_version.into(),
            trained_at: Utc::now(),
            categories,
            scaler,
            ensemble,
            training,
            fingerprint: String::new(),
        };
        artifact.fingerprint = artifact.compute_fingerprint()?;
        Ok(artifact)
    }

    /// blake3 hex digest of the canonical JSON of categories, scaler and ensemble
    pub fn compute_fingerprint(&self) -> Result<String, serde_json::Error> {
        let content = SealedContent {
            categories: &self.categories,
            scaler: &self.scaler,
            ensemble: &self.ensemble,
        };
        let mut hasher = blake3::Hasher::new();
        serde_json::to_writer(&mut hasher, &content)?;
        Ok(hasher.finalize().to_hex().to_string())
    }

    /// Structural and integrity checks, in that order
    pub fn validate(&self) -> Result<(), ArtifactLoadError> {
        if self.categories.is_empty() {
            return Err(ArtifactLoadError::InvalidStructure(
                "category table is empty".to_string(),
            ));
        }
        self.scaler
            .validate()
            .map_err(ArtifactLoadError::InvalidStructure)?;
        self.ensemble
            .validate()
            .map_err(ArtifactLoadError::InvalidStructure)?;

        let actual = self.compute_fingerprint()?;
        if actual != self.fingerprint {
            return Err(ArtifactLoadError::FingerprintMismatch {
                expected: self.fingerprint.clone(),
                actual,
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, ArtifactLoadError> {
        let probe: VersionProbe = serde_json::from_str(json)?;
        if probe.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactLoadError::UnsupportedVersion {
                found: probe.format_version,
                supported: ARTIFACT_FORMAT_VERSION,
            });
        }

        let artifact: ModelArtifact = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactLoadError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ArtifactLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let artifact = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            model_version = %artifact.model_version,
            trees = artifact.ensemble.n_trees(),
            "Loaded model artifact"
        );
        Ok(artifact)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let json = self.to_json().context("Failed to serialize model artifact")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write model artifact {}", path.display()))?;

        info!(
            path = %path.display(),
            model_version = %self.model_version,
            fingerprint = %self.fingerprint,
            "Saved model artifact"
        );
        Ok(())
    }

    /// Scale, evaluate and clamp one encoded feature vector
    pub fn predict_scores(&self, features: &FeatureVector) -> Result<ScoreTriple, InferenceError> {
        let normalized = self.scaler.scale(features);
        ScoreTriple::from_raw(self.ensemble.predict_raw(normalized.as_array()))
    }
}
