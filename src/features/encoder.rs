//! Feature Encoder
//!
//! Validates numeric readings against their accepted domains and maps the
//! visual condition label to the integer code the model was trained with.
//!
//! The label-to-code mapping is an explicit, versioned table stored inside the
//! model artifact. Codes follow sorted lexical order of the labels:
//! Healthy=0, Leaf Curling=1, Spotting=2, Wilting=3, Yellowing=4.

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::request::{PredictionRequest, SensorReadings};
use super::{FeatureVector, N_FEATURES, VISUAL_FEATURE};
use crate::error::ValidationError;
use crate::parameters::Parameter;

const VISUAL_FIELD: &str = "visual_condition";

/// Observed plant condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VisualCondition {
    Healthy,
    Yellowing,
    Wilting,
    #[serde(rename = "Leaf Curling")]
    LeafCurling,
    Spotting,
}

impl VisualCondition {
    pub const ALL: [VisualCondition; 5] = [
        VisualCondition::Healthy,
        VisualCondition::Yellowing,
        VisualCondition::Wilting,
        VisualCondition::LeafCurling,
        VisualCondition::Spotting,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            VisualCondition::Healthy => "Healthy",
            VisualCondition::Yellowing => "Yellowing",
            VisualCondition::Wilting => "Wilting",
            VisualCondition::LeafCurling => "Leaf Curling",
            VisualCondition::Spotting => "Spotting",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    /// Any visible symptom at all
    pub fn shows_symptoms(&self) -> bool {
        *self != VisualCondition::Healthy
    }
}

impl fmt::Display for VisualCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VisualCondition {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| ValidationError::UnknownCategory {
            field: VISUAL_FIELD,
            value: s.to_string(),
            expected: Self::ALL.map(|c| c.label()).join(", "),
        })
    }
}

// ============================================================================
// Category Table
// ============================================================================

/// Versioned label -> code table embedded in the model artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CategoryTableRepr", into = "CategoryTableRepr")]
pub struct CategoryTable {
    version: u32,
    labels: Vec<String>,
    index: FxHashMap<String, usize>,
}

/// On-disk form: the index is rebuilt on load
#[derive(Serialize, Deserialize)]
struct CategoryTableRepr {
    version: u32,
    labels: Vec<String>,
}

impl CategoryTable {
    /// Current encoding version written by the trainer
    pub const CURRENT_VERSION: u32 = 1;

    /// Table with every known condition, codes in sorted lexical order
    pub fn lexical() -> Self {
        let mut labels: Vec<String> = VisualCondition::ALL
            .iter()
            .map(|c| c.label().to_string())
            .collect();
        labels.sort();
        Self::from_labels(Self::CURRENT_VERSION, labels)
            .unwrap_or_else(|_| unreachable!("built-in labels are unique and known"))
    }

    /// Build a table from explicit labels (code = position)
    pub fn from_labels(version: u32, labels: Vec<String>) -> Result<Self, String> {
        if labels.is_empty() {
            return Err("category table has no labels".to_string());
        }

        let mut index = FxHashMap::default();
        for (code, label) in labels.iter().enumerate() {
            if VisualCondition::from_label(label).is_none() {
                return Err(format!("category table contains unknown label '{}'", label));
            }
            if index.insert(label.clone(), code).is_some() {
                return Err(format!("category table lists '{}' twice", label));
            }
        }

        Ok(Self { version, labels, index })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Code for a label; unknown labels are an error, never a default
    pub fn code(&self, label: &str) -> Result<usize, ValidationError> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| ValidationError::UnknownCategory {
                field: VISUAL_FIELD,
                value: label.to_string(),
                expected: self.labels.join(", "),
            })
    }

    /// Code for a known condition
    pub fn code_of(&self, condition: VisualCondition) -> Result<usize, ValidationError> {
        self.code(condition.label())
    }
}

impl TryFrom<CategoryTableRepr> for CategoryTable {
    type Error = String;

    fn try_from(repr: CategoryTableRepr) -> Result<Self, Self::Error> {
        Self::from_labels(repr.version, repr.labels)
    }
}

impl From<CategoryTable> for CategoryTableRepr {
    fn from(table: CategoryTable) -> Self {
        Self {
            version: table.version,
            labels: table.labels,
        }
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// What to do with a finite numeric reading outside its accepted domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangePolicy {
    /// Reject with `ValidationError::OutOfRange`
    #[default]
    Reject,
    /// Clamp to the nearest bound and record the field (lowers confidence)
    Clamp,
}

impl FromStr for RangePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(RangePolicy::Reject),
            "clamp" => Ok(RangePolicy::Clamp),
            other => Err(format!("unknown range policy '{}' (expected reject or clamp)", other)),
        }
    }
}

/// Output of the encoder
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedInput {
    pub readings: SensorReadings,
    pub features: FeatureVector,
    /// Parameters clamped under `RangePolicy::Clamp`, in table order
    pub clamped: SmallVec<[Parameter; 4]>,
}

/// Validate a request and encode it into the unscaled feature vector.
///
/// NaN and infinite readings are always rejected, whatever the policy.
pub fn encode(
    request: &PredictionRequest,
    categories: &CategoryTable,
    policy: RangePolicy,
) -> Result<EncodedInput, ValidationError> {
    let mut features = [0.0; N_FEATURES];
    let mut clamped = SmallVec::new();

    for parameter in Parameter::ALL {
        let spec = parameter.spec();
        let raw = request.value(parameter);

        features[parameter.index()] = if spec.domain.contains(raw) {
            raw
        } else if policy == RangePolicy::Clamp && raw.is_finite() {
            clamped.push(parameter);
            spec.domain.clamp(raw)
        } else {
            return Err(ValidationError::OutOfRange {
                field: spec.field,
                value: raw,
                min: spec.domain.min,
                max: spec.domain.max,
            });
        };
    }

    let visual: VisualCondition = request.visual_condition.parse()?;
    features[VISUAL_FEATURE] = categories.code_of(visual)? as f64;

    let readings = SensorReadings {
        ph: features[Parameter::Ph.index()],
        ec: features[Parameter::Ec.index()],
        water_temperature: features[Parameter::WaterTemperature.index()],
        air_humidity: features[Parameter::AirHumidity.index()],
        visual,
    };

    Ok(EncodedInput {
        readings,
        features: FeatureVector(features),
        clamped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn optimal(visual: &str) -> PredictionRequest {
        PredictionRequest::new(6.0, 1200.0, 21.0, 60.0, visual)
    }

    #[test]
    fn test_lexical_codes() {
        let table = CategoryTable::lexical();
        assert_eq!(table.code("Healthy").unwrap(), 0);
        assert_eq!(table.code("Leaf Curling").unwrap(), 1);
        assert_eq!(table.code("Spotting").unwrap(), 2);
        assert_eq!(table.code("Wilting").unwrap(), 3);
        assert_eq!(table.code("Yellowing").unwrap(), 4);
    }

    #[test]
    fn test_encode_passes_numeric_fields_through() {
        let encoded = encode(&optimal("Wilting"), &CategoryTable::lexical(), RangePolicy::Reject)
            .unwrap();
        assert_eq!(encoded.features.0, [6.0, 1200.0, 21.0, 60.0, 3.0]);
        assert_eq!(encoded.readings.visual, VisualCondition::Wilting);
        assert!(encoded.clamped.is_empty());
    }

    #[test]
    fn test_unknown_category_is_an_error() {
        let err = encode(&optimal("Purple"), &CategoryTable::lexical(), RangePolicy::Reject)
            .unwrap_err();
        match err {
            ValidationError::UnknownCategory { field, value, expected } => {
                assert_eq!(field, "visual_condition");
                assert_eq!(value, "Purple");
                assert!(expected.contains("Leaf Curling"));
            }
            other => panic!("expected UnknownCategory, got {:?}", other),
        }
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let table = CategoryTable::lexical();
        assert!(encode(&optimal("healthy"), &table, RangePolicy::Reject).is_err());
    }

    #[test]
    fn test_out_of_range_reports_field_and_bounds() {
        let mut req = optimal("Healthy");
        req.ec_value = 3500.0;
        let err = encode(&req, &CategoryTable::lexical(), RangePolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                field: "ec_value",
                value: 3500.0,
                min: 200.0,
                max: 3000.0,
            }
        );
    }

    #[test]
    fn test_domain_bounds_are_inclusive() {
        let req = PredictionRequest::new(3.0, 3000.0, 5.0, 100.0, "Spotting");
        assert!(encode(&req, &CategoryTable::lexical(), RangePolicy::Reject).is_ok());
    }

    #[test]
    fn test_clamp_policy_records_fields() {
        let req = PredictionRequest::new(9.6, 1200.0, 2.0, 60.0, "Healthy");
        let encoded = encode(&req, &CategoryTable::lexical(), RangePolicy::Clamp).unwrap();
        assert_eq!(encoded.readings.ph, 9.0);
        assert_eq!(encoded.readings.water_temperature, 5.0);
        assert_eq!(
            encoded.clamped.as_slice(),
            &[Parameter::Ph, Parameter::WaterTemperature]
        );
    }

    #[test]
    fn test_nan_rejected_even_when_clamping() {
        let req = PredictionRequest::new(f64::NAN, 1200.0, 21.0, 60.0, "Healthy");
        let err = encode(&req, &CategoryTable::lexical(), RangePolicy::Clamp).unwrap_err();
        assert_eq!(err.field(), "ph_value");
    }

    #[test]
    fn test_table_rejects_duplicates_and_unknown_labels() {
        assert!(CategoryTable::from_labels(1, vec!["Healthy".into(), "Healthy".into()]).is_err());
        assert!(CategoryTable::from_labels(1, vec!["Mouldy".into()]).is_err());
        assert!(CategoryTable::from_labels(1, vec![]).is_err());
    }

    #[test]
    fn test_table_serde_rebuilds_index() {
        let table = CategoryTable::lexical();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(
            json,
            r#"{"version":1,"labels":["Healthy","Leaf Curling","Spotting","Wilting","Yellowing"]}"#
        );
        let back: CategoryTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
        assert_eq!(back.code("Wilting").unwrap(), 3);
    }

    #[test]
    fn test_range_policy_from_str() {
        assert_eq!("clamp".parse::<RangePolicy>().unwrap(), RangePolicy::Clamp);
        assert_eq!(" Reject ".parse::<RangePolicy>().unwrap(), RangePolicy::Reject);
        assert!("ignore".parse::<RangePolicy>().is_err());
    }
}
