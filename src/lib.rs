//! Hydroponic Plant Health Engine
//!
//! Predicts plant health, growth and yield from four sensor readings and a
//! visual observation, then explains the result with rule-based disease risk,
//! nutrient issues and environmental advice.
//!
//! Pipeline: request -> `features` (validate, encode, scale) -> `model`
//! (boosted trees) -> `rules` (status, risk, advice, confidence) -> response.
//!
//! - `parameters`: Sensor parameter table (domains, optimal bands, tolerances)
//! - `features/`: Request schema, category encoding, scaler
//! - `model/`: Multi-output gradient-boosted trees and the model artifact
//! - `rules/`: Rule engine producing the prediction response
//! - `predictor`: Shared predictor and hot-swappable handle
//! - `training/`: Synthetic data, CSV loading, training pipeline
//! - `api_server`: Axum transport adapter (feature `api`)

pub mod error;
pub mod parameters;
pub mod features;
pub mod model;
pub mod rules;
pub mod descriptor;
pub mod predictor;
pub mod config;
pub mod training;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use config::{ServiceConfig, TrainingConfig};
pub use descriptor::{FeatureDescriptor, ModelDescriptor};
pub use error::{ArtifactLoadError, InferenceError, PredictError, ValidationError};
pub use features::{PredictionRequest, RangePolicy, VisualCondition};
pub use model::{BoostingParams, ModelArtifact, Monotone, MonotoneConstraint, ScoreTriple};
pub use parameters::{Parameter, PARAMETERS};
pub use predictor::{HealthReport, Predictor, PredictorHandle};
pub use rules::{GrowthRate, HealthStatus, PredictionResponse, RiskLevel};
pub use training::{train, train_synthetic, TrainingSet};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
