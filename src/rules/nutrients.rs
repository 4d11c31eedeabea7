//! Nutrient issue detection
//!
//! pH drives availability problems, EC drives supply problems and visual
//! symptoms point at specific deficiencies. A low predicted health score adds
//! a whole-plant stress entry last. When nothing is flagged the list holds
//! exactly one all-clear entry.

use serde::{Deserialize, Serialize};

use super::status::{LOWER_TIER, UPPER_TIER};
use crate::features::VisualCondition;
use crate::parameters::{BandComparison, BandFit, Parameter, ParameterSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

impl Severity {
    /// Bucket a 0-1 parameter severity
    pub fn from_score(score: f64) -> Self {
        if score <= 1.0 / 3.0 {
            Severity::Low
        } else if score <= 2.0 / 3.0 {
            Severity::Medium
        } else {
            Severity::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientIssue {
    pub nutrient: String,
    pub issue: String,
    pub severity: Severity,
    pub action: String,
}

impl NutrientIssue {
    fn new(nutrient: &str, issue: String, severity: Severity, action: String) -> Self {
        Self {
            nutrient: nutrient.to_string(),
            issue,
            severity,
            action,
        }
    }

    pub fn all_clear() -> Self {
        Self::new(
            "All",
            "No nutrient issues detected".to_string(),
            Severity::None,
            "Maintain current nutrient regime".to_string(),
        )
    }
}

fn quote(spec: &ParameterSpec, value: f64) -> String {
    format!("{:.*}{}", spec.precision, value, spec.unit)
}

fn band_text(spec: &ParameterSpec) -> String {
    format!(
        "{:.*}-{:.*}{}",
        spec.precision, spec.optimal.min, spec.precision, spec.optimal.max, spec.unit
    )
}

fn ph_issue(c: &BandComparison) -> Option<NutrientIssue> {
    let spec = Parameter::Ph.spec();
    let severity = Severity::from_score(c.severity);
    match c.fit {
        BandFit::Within => None,
        BandFit::Below => Some(NutrientIssue::new(
            "Phosphorus, Calcium, Magnesium",
            format!("Reduced availability at acidic pH {}", quote(spec, c.value)),
            severity,
            format!("Raise pH toward {}: {}", band_text(spec), spec.raise_advice),
        )),
        BandFit::Above => Some(NutrientIssue::new(
            "Iron, Manganese, Zinc",
            format!("Micronutrient lockout at alkaline pH {}", quote(spec, c.value)),
            severity,
            format!("Lower pH toward {}: {}", band_text(spec), spec.lower_advice),
        )),
    }
}

fn ec_issue(c: &BandComparison) -> Option<NutrientIssue> {
    let spec = Parameter::Ec.spec();
    let severity = Severity::from_score(c.severity);
    match c.fit {
        BandFit::Within => None,
        BandFit::Below => Some(NutrientIssue::new(
            "Nitrogen, Phosphorus, Potassium",
            format!("NPK deficiency likely at EC {}", quote(spec, c.value)),
            severity,
            format!("Raise EC toward {}: {}", band_text(spec), spec.raise_advice),
        )),
        BandFit::Above => Some(NutrientIssue::new(
            "Salts",
            format!("Salt accumulation and nutrient burn risk at EC {}", quote(spec, c.value)),
            severity,
            format!("Lower EC toward {}: {}", band_text(spec), spec.lower_advice),
        )),
    }
}

fn visual_issue(visual: VisualCondition) -> Option<NutrientIssue> {
    let (nutrient, issue, action) = match visual {
        VisualCondition::Healthy => return None,
        VisualCondition::Yellowing => (
            "Nitrogen",
            "Yellowing suggests nitrogen deficiency",
            "Increase nitrogen in the nutrient mix",
        ),
        VisualCondition::Wilting => (
            "Potassium",
            "Wilting suggests potassium deficiency or water stress",
            "Increase potassium and check water flow and root health",
        ),
        VisualCondition::LeafCurling => (
            "Calcium, Boron",
            "Leaf curling suggests calcium or boron deficiency",
            "Supplement calcium (e.g. calcium nitrate) and check boron",
        ),
        VisualCondition::Spotting => (
            "Magnesium, Sulfur",
            "Spotting suggests magnesium or sulfur deficiency",
            "Add Epsom salt or a magnesium supplement",
        ),
    };
    Some(NutrientIssue::new(nutrient, issue.to_string(), Severity::Medium, action.to_string()))
}

fn stress_issue(health_score: f64) -> Option<NutrientIssue> {
    let (issue, severity, action) = if health_score < LOWER_TIER {
        (
            "Plant severely stressed",
            Severity::High,
            "Review all parameters immediately",
        )
    } else if health_score < UPPER_TIER {
        (
            "Plant moderately stressed",
            Severity::Medium,
            "Optimize growing conditions",
        )
    } else {
        return None;
    };
    Some(NutrientIssue::new(
        "Overall",
        format!("{} (health score {:.2})", issue, health_score),
        severity,
        action.to_string(),
    ))
}

pub fn assess_nutrients(
    comparisons: &[BandComparison; 4],
    visual: VisualCondition,
    health_score: f64,
) -> Vec<NutrientIssue> {
    let issues: Vec<NutrientIssue> = [
        ph_issue(&comparisons[Parameter::Ph.index()]),
        ec_issue(&comparisons[Parameter::Ec.index()]),
        visual_issue(visual),
        stress_issue(health_score),
    ]
    .into_iter()
    .flatten()
    .collect();

    if issues.is_empty() {
        vec![NutrientIssue::all_clear()]
    } else {
        issues
    }
}
