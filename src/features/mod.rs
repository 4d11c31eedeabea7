//! Feature preprocessing
//!
//! - `request.rs` - Wire request and validated sensor readings
//! - `encoder.rs` - Visual condition labels, category table, range validation
//! - `scaler.rs` - Fixed mean/std normalization fitted at training time

pub mod request;
pub mod encoder;
pub mod scaler;

use serde::{Deserialize, Serialize};

pub use request::{PredictionRequest, SensorReadings};
pub use encoder::{encode, CategoryTable, EncodedInput, RangePolicy, VisualCondition};
pub use scaler::FeatureScaler;

/// pH, EC, water temperature, air humidity, visual condition code
pub const N_FEATURES: usize = 5;

/// Feature names in vector order (as recorded in the model descriptor)
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "pH",
    "EC",
    "water_temperature",
    "air_humidity",
    "visual_condition_encoded",
];

/// Index of the encoded visual condition in the feature vector
pub const VISUAL_FEATURE: usize = 4;

/// Encoded (unscaled) feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; N_FEATURES]);

/// Feature vector after scaling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedVector(pub [f64; N_FEATURES]);

impl FeatureVector {
    pub fn as_array(&self) -> &[f64; N_FEATURES] {
        &self.0
    }
}

impl NormalizedVector {
    pub fn as_array(&self) -> &[f64; N_FEATURES] {
        &self.0
    }
}
