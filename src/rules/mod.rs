//! Rule Engine
//!
//! Turns model scores and validated readings into the grower-facing response.
//! Every rule reads the same [`PARAMETERS`](crate::parameters::PARAMETERS)
//! table through one band comparison per reading.
//!
//! ## Architecture
//! - `status.rs` - Health status / growth rate tiers
//! - `disease.rs` - Rule-based disease risk with named breakdown
//! - `nutrients.rs` - Nutrient issue detection
//! - `environment.rs` - Per-parameter adjustment text
//! - `confidence.rs` - Confidence score

pub mod status;
pub mod disease;
pub mod nutrients;
pub mod environment;
pub mod confidence;

use serde::{Deserialize, Serialize};

use crate::features::{EncodedInput, SensorReadings};
use crate::model::ScoreTriple;
use crate::parameters::{compare_to_band, BandComparison, Parameter};

pub use confidence::confidence_score;
pub use disease::{assess_disease_risk, DiseaseRisk, RiskLevel};
pub use environment::environmental_recommendations;
pub use nutrients::{assess_nutrients, NutrientIssue, Severity};
pub use status::{classify_growth, classify_health, GrowthRate, HealthStatus};

/// Full prediction output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub health_score: f64,
    pub growth_score: f64,
    pub yield_score: f64,
    /// `yield_score * 100`
    pub yield_prediction: f64,
    pub plant_health_status: HealthStatus,
    pub growth_rate: GrowthRate,
    pub disease_risk: DiseaseRisk,
    pub nutrient_issues: Vec<NutrientIssue>,
    pub environmental_recommendations: Vec<String>,
    pub confidence_score: f64,
    /// Fields clamped under the clamp policy (wire names)
    pub clamped_fields: Vec<String>,
    pub model_version: String,
}

/// One comparison per parameter, in table order
pub fn compare_readings(readings: &SensorReadings) -> [BandComparison; 4] {
    Parameter::ALL.map(|p| compare_to_band(p, readings.value(p)))
}

pub fn build_response(scores: ScoreTriple, input: &EncodedInput, model_version: &str) -> PredictionResponse {
    let comparisons = compare_readings(&input.readings);
    let visual = input.readings.visual;

    PredictionResponse {
        health_score: scores.health_score,
        growth_score: scores.growth_score,
        yield_score: scores.yield_score,
        yield_prediction: scores.yield_score * 100.0,
        plant_health_status: classify_health(scores.health_score),
        growth_rate: classify_growth(scores.growth_score),
        disease_risk: assess_disease_risk(&comparisons, visual),
        nutrient_issues: assess_nutrients(&comparisons, visual, scores.health_score),
        environmental_recommendations: environmental_recommendations(&comparisons),
        confidence_score: confidence_score(&comparisons, input.clamped.len()),
        clamped_fields: input.clamped.iter().map(|p| p.field().to_string()).collect(),
        model_version: model_version.to_string(),
    }
}
