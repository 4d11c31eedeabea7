// Shared fixtures: one synthetic model trained per test binary

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use hydro_health_engine::{
    train_synthetic, ModelArtifact, PredictionRequest, Predictor, TrainingConfig,
};

pub const TEST_MODEL_VERSION: &str = "test-model";

/// Default training config; trained once and shared
pub fn trained_artifact() -> Arc<ModelArtifact> {
    static ARTIFACT: OnceLock<Arc<ModelArtifact>> = OnceLock::new();
    ARTIFACT
        .get_or_init(|| {
            let config = TrainingConfig {
                model_version: Some(TEST_MODEL_VERSION.to_string()),
                ..TrainingConfig::default()
            };
            Arc::new(train_synthetic(&config).expect("synthetic training should succeed"))
        })
        .clone()
}

pub fn predictor() -> Predictor {
    Predictor::new(trained_artifact())
}

pub fn request(ph: f64, ec: f64, water_temp: f64, humidity: f64, visual: &str) -> PredictionRequest {
    PredictionRequest::new(ph, ec, water_temp, humidity, visual)
}

pub fn optimal_request() -> PredictionRequest {
    request(6.0, 1200.0, 21.0, 60.0, "Healthy")
}

pub fn stressed_request() -> PredictionRequest {
    request(4.0, 2500.0, 32.0, 45.0, "Wilting")
}
