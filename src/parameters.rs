//! Monitored Parameters
//!
//! Single table of the four numeric sensor parameters: accepted input domain,
//! optimal growing band, and the deviation tolerance used to turn a distance
//! from the band into a 0-1 severity. The encoder, rule engine, synthetic
//! target generator and model descriptor all read from [`PARAMETERS`].

use serde::{Deserialize, Serialize};

/// Numeric sensor parameter, in feature-vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Ph,
    Ec,
    WaterTemperature,
    AirHumidity,
}

impl Parameter {
    /// All parameters in feature-vector (and recommendation) order
    pub const ALL: [Parameter; 4] = [
        Parameter::Ph,
        Parameter::Ec,
        Parameter::WaterTemperature,
        Parameter::AirHumidity,
    ];

    /// Position in the feature vector
    pub fn index(self) -> usize {
        match self {
            Parameter::Ph => 0,
            Parameter::Ec => 1,
            Parameter::WaterTemperature => 2,
            Parameter::AirHumidity => 3,
        }
    }

    /// Table entry for this parameter
    pub fn spec(self) -> &'static ParameterSpec {
        &PARAMETERS[self.index()]
    }

    /// Wire field name (matches the request JSON)
    pub fn field(self) -> &'static str {
        self.spec().field
    }
}

/// Closed numeric interval `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive on both ends; NaN is never contained
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Static description of one monitored parameter
#[derive(Debug, Clone, Copy)]
pub struct ParameterSpec {
    pub parameter: Parameter,
    /// Wire field name
    pub field: &'static str,
    /// Human-readable label used in recommendation text
    pub label: &'static str,
    pub unit: &'static str,
    /// Decimal places when quoting a reading back to the grower
    pub precision: usize,
    /// Accepted input domain; values outside are rejected (or clamped)
    pub domain: Band,
    /// Optimal growing band
    pub optimal: Band,
    /// Deviation from the band at which severity saturates at 1.0
    pub tolerance: f64,
    /// Adjustment advice when the reading is below the band
    pub raise_advice: &'static str,
    /// Adjustment advice when the reading is above the band
    pub lower_advice: &'static str,
}

pub const PARAMETERS: [ParameterSpec; 4] = [
    ParameterSpec {
        parameter: Parameter::Ph,
        field: "ph_value",
        label: "pH",
        unit: "",
        precision: 1,
        domain: Band::new(3.0, 9.0),
        optimal: Band::new(5.5, 7.0),
        tolerance: 1.5,
        raise_advice: "add potassium hydroxide or a pH-up solution",
        lower_advice: "add phosphoric acid or a pH-down solution",
    },
    ParameterSpec {
        parameter: Parameter::Ec,
        field: "ec_value",
        label: "EC",
        unit: " µS/cm",
        precision: 0,
        domain: Band::new(200.0, 3000.0),
        optimal: Band::new(800.0, 1800.0),
        tolerance: 700.0,
        raise_advice: "increase nutrient solution concentration",
        lower_advice: "dilute the solution with fresh water to prevent salt stress",
    },
    ParameterSpec {
        parameter: Parameter::WaterTemperature,
        field: "water_temperature",
        label: "Water temperature",
        unit: "°C",
        precision: 1,
        domain: Band::new(5.0, 40.0),
        optimal: Band::new(18.0, 24.0),
        tolerance: 8.0,
        raise_advice: "use a heater",
        lower_advice: "use a chiller or shade the reservoir",
    },
    ParameterSpec {
        parameter: Parameter::AirHumidity,
        field: "air_humidity",
        label: "Air humidity",
        unit: "%",
        precision: 0,
        domain: Band::new(10.0, 100.0),
        optimal: Band::new(50.0, 75.0),
        tolerance: 25.0,
        raise_advice: "mist or run a humidifier",
        lower_advice: "improve ventilation to reduce fungal disease risk",
    },
];

// ============================================================================
// Band Comparison
// ============================================================================

/// Position of a reading relative to a parameter's optimal band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandFit {
    /// reading < optimal.min
    Below,
    /// optimal.min <= reading <= optimal.max
    Within,
    /// reading > optimal.max
    Above,
}

/// Result of comparing one reading against its optimal band
#[derive(Debug, Clone, Copy)]
pub struct BandComparison {
    pub parameter: Parameter,
    pub fit: BandFit,
    pub value: f64,
    /// Absolute distance outside the band (0 if within)
    pub deviation: f64,
    /// `min(deviation / tolerance, 1)`
    pub severity: f64,
}

impl BandComparison {
    pub fn is_within(&self) -> bool {
        self.fit == BandFit::Within
    }

    /// Severity counted only when the reading is above the band
    pub fn severity_above(&self) -> f64 {
        if self.fit == BandFit::Above { self.severity } else { 0.0 }
    }

    /// Severity counted only when the reading is below the band
    pub fn severity_below(&self) -> f64 {
        if self.fit == BandFit::Below { self.severity } else { 0.0 }
    }

    /// Inside the band but within `margin_fraction` of its width from an edge
    pub fn is_near_edge(&self, margin_fraction: f64) -> bool {
        if !self.is_within() {
            return false;
        }
        let optimal = self.parameter.spec().optimal;
        let margin = optimal.width() * margin_fraction;
        self.value - optimal.min < margin || optimal.max - self.value < margin
    }
}

/// Compare a reading against the parameter's optimal band
pub fn compare_to_band(parameter: Parameter, value: f64) -> BandComparison {
    let spec = parameter.spec();

    let (fit, deviation) = if value < spec.optimal.min {
        (BandFit::Below, spec.optimal.min - value)
    } else if value > spec.optimal.max {
        (BandFit::Above, value - spec.optimal.max)
    } else {
        (BandFit::Within, 0.0)
    };

    BandComparison {
        parameter,
        fit,
        value,
        deviation,
        severity: (deviation / spec.tolerance).min(1.0),
    }
}
