//! Prediction request and validated readings

use serde::{Deserialize, Serialize};

use super::encoder::VisualCondition;
use crate::parameters::Parameter;

/// Input schema for a plant health prediction.
///
/// Field aliases accept the short names used by sensor exports
/// (`pH`, `EC`, `water_temp`, `humidity`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// 3.0 - 9.0
    #[serde(alias = "pH")]
    pub ph_value: f64,

    /// EC in µS/cm, 200 - 3000
    #[serde(alias = "EC")]
    pub ec_value: f64,

    /// °C, 5 - 40
    #[serde(alias = "water_temp")]
    pub water_temperature: f64,

    /// %, 10 - 100
    #[serde(alias = "humidity")]
    pub air_humidity: f64,

    /// One of: Healthy, Yellowing, Wilting, Leaf Curling, Spotting
    pub visual_condition: String,
}

impl PredictionRequest {
    pub fn new(
        ph_value: f64,
        ec_value: f64,
        water_temperature: f64,
        air_humidity: f64,
        visual_condition: impl Into<String>,
    ) -> Self {
        Self {
            ph_value,
            ec_value,
            water_temperature,
            air_humidity,
            visual_condition: visual_condition.into(),
        }
    }

    /// Raw numeric value for a parameter
    pub fn value(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Ph => self.ph_value,
            Parameter::Ec => self.ec_value,
            Parameter::WaterTemperature => self.water_temperature,
            Parameter::AirHumidity => self.air_humidity,
        }
    }
}

/// Readings after validation (and clamping, if that policy is active).
/// This is what the rule engine sees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReadings {
    pub ph: f64,
    pub ec: f64,
    pub water_temperature: f64,
    pub air_humidity: f64,
    pub visual: VisualCondition,
}

impl SensorReadings {
    pub fn value(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Ph => self.ph,
            Parameter::Ec => self.ec,
            Parameter::WaterTemperature => self.water_temperature,
            Parameter::AirHumidity => self.air_humidity,
        }
    }
}
