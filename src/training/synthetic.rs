//! Synthetic training data
//!
//! Readings are drawn mostly from the ranges a real hydroponic system sits in,
//! with a share drawn from the full accepted domain so the edges are covered.
//! Targets come from [`target_scores`], a deterministic function of the band
//! severities and the visual symptom, plus uniform noise.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::TrainingSet;
use crate::features::{CategoryTable, FeatureVector, SensorReadings, VisualCondition, N_FEATURES, VISUAL_FEATURE};
use crate::model::N_OUTPUTS;
use crate::parameters::{compare_to_band, Band, Parameter};

/// Share of rows drawn from realistic operating ranges
pub const REALISTIC_SHARE: f64 = 0.7;

/// Realistic operating ranges, in table order
pub const REALISTIC_RANGES: [Band; 4] = [
    Band::new(4.5, 8.5),
    Band::new(600.0, 2400.0),
    Band::new(14.0, 30.0),
    Band::new(35.0, 90.0),
];

/// Target shape per output: value at optimum and per-parameter severity weights
struct TargetProfile {
    optimum: f64,
    weights: [f64; 4],
}

const TARGET_PROFILES: [TargetProfile; N_OUTPUTS] = [
    // health
    TargetProfile { optimum: 1.0, weights: [0.35, 0.25, 0.20, 0.10] },
    // growth
    TargetProfile { optimum: 0.95, weights: [0.30, 0.30, 0.25, 0.15] },
    // yield
    TargetProfile { optimum: 0.84, weights: [0.30, 0.30, 0.20, 0.15] },
];

/// Score penalty per output for a visible symptom
fn visual_penalty(visual: VisualCondition) -> [f64; N_OUTPUTS] {
    match visual {
        VisualCondition::Healthy => [0.0, 0.0, 0.0],
        VisualCondition::Yellowing => [0.25, 0.20, 0.20],
        VisualCondition::LeafCurling => [0.25, 0.20, 0.25],
        VisualCondition::Spotting => [0.30, 0.15, 0.20],
        VisualCondition::Wilting => [0.35, 0.30, 0.30],
    }
}

/// Noise-free health, growth and yield for a set of readings
pub fn target_scores(readings: &SensorReadings) -> [f64; N_OUTPUTS] {
    let severities = Parameter::ALL.map(|p| compare_to_band(p, readings.value(p)).severity);
    let penalty = visual_penalty(readings.visual);

    let mut out = [0.0; N_OUTPUTS];
    for (o, profile) in TARGET_PROFILES.iter().enumerate() {
        let loss: f64 = profile.weights.iter().zip(severities).map(|(w, s)| w * s).sum();
        out[o] = (profile.optimum - loss - penalty[o]).clamp(0.0, 1.0);
    }
    out
}

fn sample_visual(rng: &mut StdRng) -> VisualCondition {
    let r: f64 = rng.gen();
    if r < 0.40 {
        VisualCondition::Healthy
    } else if r < 0.55 {
        VisualCondition::Yellowing
    } else if r < 0.70 {
        VisualCondition::Wilting
    } else if r < 0.85 {
        VisualCondition::LeafCurling
    } else {
        VisualCondition::Spotting
    }
}

/// Generate `n_samples` labelled rows, encoded with `categories`
pub fn generate(n_samples: usize, seed: u64, noise: f64, categories: &CategoryTable) -> Result<TrainingSet> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(n_samples);
    let mut targets = Vec::with_capacity(n_samples);

    for _ in 0..n_samples {
        let realistic = rng.gen::<f64>() < REALISTIC_SHARE;

        let mut values = [0.0; 4];
        for p in Parameter::ALL {
            let range = if realistic { REALISTIC_RANGES[p.index()] } else { p.spec().domain };
            values[p.index()] = rng.gen_range(range.min..=range.max);
        }

        let visual = sample_visual(&mut rng);
        let readings = SensorReadings {
            ph: values[0],
            ec: values[1],
            water_temperature: values[2],
            air_humidity: values[3],
            visual,
        };

        let mut target = target_scores(&readings);
        if noise > 0.0 {
            for t in target.iter_mut() {
                *t = (*t + rng.gen_range(-noise..=noise)).clamp(0.0, 1.0);
            }
        }

        let mut features = [0.0; N_FEATURES];
        features[..4].copy_from_slice(&values);
        features[VISUAL_FEATURE] = categories.code_of(visual)? as f64;

        rows.push(FeatureVector(features));
        targets.push(target);
    }

    Ok(TrainingSet { rows, targets })
}
