//! Predictor
//!
//! `Predictor` owns a loaded artifact (behind `Arc`) plus the range policy and
//! runs the encode -> scale -> ensemble -> rules pipeline. It holds no mutable
//! state, so it is shared across request handlers without locking.
//!
//! `PredictorHandle` is the swappable slot the server holds. A reload builds a
//! complete new `Predictor` and swaps the `Arc`; requests already running keep
//! the snapshot they cloned.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::descriptor::ModelDescriptor;
use crate::error::{ArtifactLoadError, PredictError};
use crate::features::{encode, PredictionRequest, RangePolicy};
use crate::model::ModelArtifact;
use crate::rules::{build_response, PredictionResponse};

#[derive(Debug)]
pub struct Predictor {
    artifact: Arc<ModelArtifact>,
    policy: RangePolicy,
    descriptor: ModelDescriptor,
}

impl Predictor {
    pub fn new(artifact: Arc<ModelArtifact>) -> Self {
        let descriptor = ModelDescriptor::from_artifact(&artifact);
        Self {
            artifact,
            policy: RangePolicy::default(),
            descriptor,
        }
    }

    pub fn with_policy(mut self, policy: RangePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RangePolicy {
        self.policy
    }

    pub fn artifact(&self) -> &Arc<ModelArtifact> {
        &self.artifact
    }

    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    pub fn model_version(&self) -> &str {
        &self.artifact.model_version
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, PredictError> {
        let input = encode(request, &self.artifact.categories, self.policy)?;
        let scores = self.artifact.predict_scores(&input.features)?;
        let response = build_response(scores, &input, &self.artifact.model_version);

        debug!(
            status = response.plant_health_status.display_text(),
            growth = response.growth_rate.display_text(),
            disease_risk = response.disease_risk.level.display_text(),
            confidence = response.confidence_score,
            clamped = response.clamped_fields.len(),
            "Prediction complete"
        );
        Ok(response)
    }

    /// One result per request, in input order
    pub fn predict_batch(
        &self,
        requests: &[PredictionRequest],
    ) -> Vec<Result<PredictionResponse, PredictError>> {
        requests.par_iter().map(|r| self.predict(r)).collect()
    }
}

// ============================================================================
// Swappable Handle
// ============================================================================

/// Liveness report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// "healthy" with a model, "degraded" without
    pub status: String,
    pub model_loaded: bool,
    pub model_version: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct PredictorHandle {
    inner: RwLock<Option<Arc<Predictor>>>,
}

impl PredictorHandle {
    /// No model loaded (degraded)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_predictor(predictor: Predictor) -> Self {
        Self {
            inner: RwLock::new(Some(Arc::new(predictor))),
        }
    }

    /// Snapshot of the active predictor
    pub fn current(&self) -> Option<Arc<Predictor>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install a new predictor, returning the previous one
    pub fn replace(&self, predictor: Predictor) -> Option<Arc<Predictor>> {
        let next = Arc::new(predictor);
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        slot.replace(next)
    }

    /// Load an artifact from disk and swap it in. On failure the current
    /// predictor stays active.
    pub fn reload_from(
        &self,
        path: impl AsRef<Path>,
        policy: RangePolicy,
    ) -> Result<Arc<Predictor>, ArtifactLoadError> {
        let artifact = ModelArtifact::load(path)?;
        let predictor = Predictor::new(Arc::new(artifact)).with_policy(policy);
        info!(model_version = predictor.model_version(), ?policy, "Predictor installed");
        self.replace(predictor);
        self.current().ok_or_else(|| {
            ArtifactLoadError::InvalidStructure("predictor slot empty after reload".to_string())
        })
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, PredictError> {
        let predictor = self.current().ok_or(PredictError::ModelUnavailable)?;
        predictor.predict(request)
    }

    pub fn health(&self) -> HealthReport {
        let current = self.current();
        HealthReport {
            status: if current.is_some() { "healthy" } else { "degraded" }.to_string(),
            model_loaded: current.is_some(),
            model_version: current.map(|p| p.model_version().to_string()),
            timestamp: Utc::now(),
        }
    }
}
