//! Health status and growth rate tiers

use serde::{Deserialize, Serialize};

/// Scores at or above this are in the top tier
pub const UPPER_TIER: f64 = 0.66;
/// Scores at or above this (and below `UPPER_TIER`) are in the middle tier
pub const LOWER_TIER: f64 = 0.33;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Stressed,
    Diseased,
}

impl HealthStatus {
    pub fn display_text(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Stressed => "Stressed",
            HealthStatus::Diseased => "Diseased",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthRate {
    High,
    Moderate,
    Low,
}

impl GrowthRate {
    pub fn display_text(&self) -> &'static str {
        match self {
            GrowthRate::High => "High",
            GrowthRate::Moderate => "Moderate",
            GrowthRate::Low => "Low",
        }
    }
}

/// Boundary values go to the upper tier
pub fn classify_health(health_score: f64) -> HealthStatus {
    if health_score >= UPPER_TIER {
        HealthStatus::Healthy
    } else if health_score >= LOWER_TIER {
        HealthStatus::Stressed
    } else {
        HealthStatus::Diseased
    }
}

pub fn classify_growth(growth_score: f64) -> GrowthRate {
    if growth_score >= UPPER_TIER {
        GrowthRate::High
    } else if growth_score >= LOWER_TIER {
        GrowthRate::Moderate
    } else {
        GrowthRate::Low
    }
}
