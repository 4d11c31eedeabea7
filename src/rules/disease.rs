//! Disease Risk
//!
//! Rule-based and independent of the regression model. Overall risk is a
//! baseline plus weighted parameter severities plus a bonus for visible
//! symptoms. The named breakdown is driven by [`PROFILES`]; each profile only
//! counts the deviations that actually favour that disease (e.g. warm water
//! for root rot, not cold water).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::features::VisualCondition;
use crate::parameters::{BandComparison, Parameter};

pub const BASELINE_RISK: f64 = 0.05;

/// Overall-risk weight per parameter, in table order
pub const RISK_WEIGHTS: [f64; 4] = [0.15, 0.15, 0.20, 0.20];

pub const MODERATE_RISK: f64 = 0.30;
pub const HIGH_RISK: f64 = 0.60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn from_probability(p: f64) -> Self {
        if p >= HIGH_RISK {
            RiskLevel::High
        } else if p >= MODERATE_RISK {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn display_text(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseRisk {
    /// Probability in [0, 1]
    pub overall: f64,
    pub level: RiskLevel,
    /// Disease name -> probability in [0, 1]
    pub breakdown: BTreeMap<String, f64>,
}

/// Symptom contribution to overall risk
pub fn symptom_bonus(visual: VisualCondition) -> f64 {
    match visual {
        VisualCondition::Healthy => 0.0,
        VisualCondition::Yellowing => 0.10,
        VisualCondition::Wilting => 0.25,
        VisualCondition::LeafCurling => 0.15,
        VisualCondition::Spotting => 0.25,
    }
}

// ============================================================================
// Disease Profiles
// ============================================================================

/// Which side of the optimal band drives a disease
#[derive(Debug, Clone, Copy)]
pub enum Driver {
    Above(Parameter),
    Below(Parameter),
    Either(Parameter),
}

impl Driver {
    fn severity(&self, comparisons: &[BandComparison; 4]) -> f64 {
        match *self {
            Driver::Above(p) => comparisons[p.index()].severity_above(),
            Driver::Below(p) => comparisons[p.index()].severity_below(),
            Driver::Either(p) => comparisons[p.index()].severity,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiseaseProfile {
    pub name: &'static str,
    pub drivers: &'static [(Driver, f64)],
    pub symptoms: &'static [(VisualCondition, f64)],
}

impl DiseaseProfile {
    pub fn probability(&self, comparisons: &[BandComparison; 4], visual: VisualCondition) -> f64 {
        let from_readings: f64 = self
            .drivers
            .iter()
            .map(|(driver, weight)| weight * driver.severity(comparisons))
            .sum();
        let from_symptoms: f64 = self
            .symptoms
            .iter()
            .filter(|(condition, _)| *condition == visual)
            .map(|(_, weight)| weight)
            .sum();
        (from_readings + from_symptoms).clamp(0.0, 1.0)
    }
}

pub const PROFILES: [DiseaseProfile; 4] = [
    DiseaseProfile {
        name: "Root Rot",
        drivers: &[
            (Driver::Above(Parameter::WaterTemperature), 0.35),
            (Driver::Above(Parameter::Ec), 0.15),
            (Driver::Above(Parameter::AirHumidity), 0.20),
        ],
        symptoms: &[(VisualCondition::Wilting, 0.30)],
    },
    DiseaseProfile {
        name: "Powdery Mildew",
        drivers: &[
            (Driver::Above(Parameter::AirHumidity), 0.40),
            (Driver::Either(Parameter::WaterTemperature), 0.20),
        ],
        symptoms: &[(VisualCondition::Spotting, 0.30)],
    },
    DiseaseProfile {
        name: "Nutrient Burn",
        drivers: &[(Driver::Above(Parameter::Ec), 0.60)],
        symptoms: &[
            (VisualCondition::LeafCurling, 0.20),
            (VisualCondition::Spotting, 0.15),
        ],
    },
    DiseaseProfile {
        name: "pH Toxicity",
        drivers: &[
            (Driver::Below(Parameter::Ph), 0.60),
            (Driver::Above(Parameter::Ph), 0.60),
        ],
        symptoms: &[(VisualCondition::Yellowing, 0.20)],
    },
];

pub fn assess_disease_risk(comparisons: &[BandComparison; 4], visual: VisualCondition) -> DiseaseRisk {
    let weighted: f64 = comparisons
        .iter()
        .zip(RISK_WEIGHTS)
        .map(|(c, w)| w * c.severity)
        .sum();
    let overall = (BASELINE_RISK + weighted + symptom_bonus(visual)).clamp(0.0, 1.0);

    let breakdown = PROFILES
        .iter()
        .map(|profile| (profile.name.to_string(), profile.probability(comparisons, visual)))
        .collect();

    DiseaseRisk {
        overall,
        level: RiskLevel::from_probability(overall),
        breakdown,
    }
}
