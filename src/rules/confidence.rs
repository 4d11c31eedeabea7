//! Confidence score
//!
//! Starts at the baseline and loses points for readings the training data
//! covers thinly: near a band edge, outside the band, or clamped.

use crate::parameters::BandComparison;

pub const BASELINE_CONFIDENCE: f64 = 0.95;
pub const CONFIDENCE_FLOOR: f64 = 0.30;

pub const NEAR_EDGE_PENALTY: f64 = 0.03;
pub const OUT_OF_BAND_PENALTY: f64 = 0.10;
pub const CLAMP_PENALTY: f64 = 0.30;

/// "Near" = within this fraction of the band width from an edge
pub const NEAR_EDGE_MARGIN: f64 = 0.05;

pub fn confidence_score(comparisons: &[BandComparison; 4], n_clamped: usize) -> f64 {
    let mut confidence = BASELINE_CONFIDENCE;

    for c in comparisons {
        if !c.is_within() {
            confidence -= OUT_OF_BAND_PENALTY;
        } else if c.is_near_edge(NEAR_EDGE_MARGIN) {
            confidence -= NEAR_EDGE_PENALTY;
        }
    }
    confidence -= CLAMP_PENALTY * n_clamped as f64;

    confidence.clamp(CONFIDENCE_FLOOR, BASELINE_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{compare_to_band, Parameter};
    use approx::assert_relative_eq;

    fn compare(ph: f64, ec: f64, temp: f64, humidity: f64) -> [BandComparison; 4] {
        [
            compare_to_band(Parameter::Ph, ph),
            compare_to_band(Parameter::Ec, ec),
            compare_to_band(Parameter::WaterTemperature, temp),
            compare_to_band(Parameter::AirHumidity, humidity),
        ]
    }

    #[test]
    fn test_centered_readings_get_baseline() {
        assert_relative_eq!(confidence_score(&compare(6.2, 1300.0, 21.0, 62.0), 0), 0.95);
    }

    #[test]
    fn test_penalties() {
        // pH 5.55 is inside but within 0.075 of the lower edge
        assert_relative_eq!(confidence_score(&compare(5.55, 1300.0, 21.0, 62.0), 0), 0.92, epsilon = 1e-12);
        assert_relative_eq!(confidence_score(&compare(4.0, 1300.0, 21.0, 62.0), 0), 0.85, epsilon = 1e-12);
        assert_relative_eq!(confidence_score(&compare(4.0, 1300.0, 21.0, 62.0), 1), 0.55, epsilon = 1e-12);
    }

    #[test]
    fn test_non_increasing_and_floored() {
        let steps = [
            compare(6.2, 1300.0, 21.0, 62.0),
            compare(4.0, 1300.0, 21.0, 62.0),
            compare(4.0, 2500.0, 21.0, 62.0),
            compare(4.0, 2500.0, 32.0, 62.0),
            compare(4.0, 2500.0, 32.0, 20.0),
        ];
        let scores: Vec<f64> = steps.iter().map(|c| confidence_score(c, 0)).collect();
        assert!(scores.windows(2).all(|w| w[1] <= w[0]));
        assert!(scores.iter().all(|s| *s <= BASELINE_CONFIDENCE));

        assert_eq!(confidence_score(&steps[4], 4), CONFIDENCE_FLOOR);
    }
}
