//! Environmental recommendations, one per parameter in table order

use crate::parameters::{BandComparison, BandFit};

pub fn recommendation(c: &BandComparison) -> String {
    let spec = c.parameter.spec();
    let p = spec.precision;
    let reading = format!("{:.*}{}", p, c.value, spec.unit);
    let band = format!("{:.*}-{:.*}{}", p, spec.optimal.min, p, spec.optimal.max, spec.unit);

    match c.fit {
        BandFit::Within => format!("{} ({}) is within the optimal range of {}.", spec.label, reading, band),
        BandFit::Below => format!(
            "{} is too low ({}). Increase it toward {}: {}.",
            spec.label, reading, band, spec.raise_advice
        ),
        BandFit::Above => format!(
            "{} is too high ({}). Decrease it toward {}: {}.",
            spec.label, reading, band, spec.lower_advice
        ),
    }
}

pub fn environmental_recommendations(comparisons: &[BandComparison; 4]) -> Vec<String> {
    comparisons.iter().map(recommendation).collect()
}
