//! Training Pipeline
//!
//! split -> fit scaler on the training rows -> boost on scaled rows ->
//! evaluate on the holdout through the inference path -> seal the artifact.
//!
//! Configured monotone constraints are validated and moved into scaled units
//! before boosting.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use tracing::info;

use super::evaluation::EvaluationReport;
use super::{synthetic, TrainingSet};
use crate::config::TrainingConfig;
use crate::features::{CategoryTable, FeatureScaler, N_FEATURES};
use crate::model::{
    GradientBoostedEnsemble, ModelArtifact, MonotoneConstraint, ScoreTriple, TrainingSummary, N_OUTPUTS,
};

pub const SYNTHETIC_SOURCE: &str = "synthetic";

/// Train and seal an artifact from labelled rows encoded with the lexical table
pub fn train(data: TrainingSet, source: &str, config: &TrainingConfig) -> Result<ModelArtifact> {
    let n_samples = data.len();
    let (train_set, holdout) = data
        .split(config.holdout_fraction, config.seed)
        .context("Failed to split training data")?;

    info!(
        source,
        n_samples,
        n_train = train_set.len(),
        n_holdout = holdout.len(),
        "Training plant health model"
    );

    let scaler = FeatureScaler::fit(&train_set.rows);
    let x: Vec<[f64; N_FEATURES]> = train_set.rows.iter().map(|r| scaler.scale(r).0).collect();

    let constraints = config
        .monotone_constraints
        .iter()
        .map(|c| c.validate().map(|_| c.scaled(&scaler)))
        .collect::<Result<Vec<MonotoneConstraint>, String>>()
        .map_err(|e| anyhow!(e))
        .context("Invalid monotone constraint")?;

    let ensemble = GradientBoostedEnsemble::fit(&x, &train_set.targets, &config.boosting, &constraints)
        .context("Failed to fit gradient-boosted ensemble")?;

    let evaluation = if holdout.is_empty() {
        None
    } else {
        let predicted = holdout
            .rows
            .iter()
            .map(|row| {
                let raw = ensemble.predict_raw(scaler.scale(row).as_array());
                ScoreTriple::from_raw(raw).map(|s| s.as_array())
            })
            .collect::<Result<Vec<[f64; N_OUTPUTS]>, _>>()
            .context("Holdout prediction failed")?;
        let report = EvaluationReport::compute(&predicted, &holdout.targets);
        for m in &report.outputs {
            info!(output = %m.output, rmse = m.rmse, r2 = m.r2, "Holdout evaluation");
        }
        Some(report)
    };

    let model_version = config.model_version.clone().unwrap_or_else(|| {
        format!("hydro-gbt-{}-s{}", Utc::now().format("%Y%m%d"), config.seed)
    });

    let summary = TrainingSummary {
        source: source.to_string(),
        seed: config.seed,
        n_samples,
        n_train: train_set.len(),
        n_holdout: holdout.len(),
        params: config.boosting,
        evaluation,
    };

    let artifact = ModelArtifact::seal(
        model_version,
        CategoryTable::lexical(),
        scaler,
        ensemble,
        summary,
    )
    .context("Failed to seal model artifact")?;

    info!(
        model_version = %artifact.model_version,
        trees = artifact.ensemble.n_trees(),
        fingerprint = %artifact.fingerprint,
        "Model sealed"
    );
    Ok(artifact)
}

/// Generate synthetic data from `config` and train on it
pub fn train_synthetic(config: &TrainingConfig) -> Result<ModelArtifact> {
    let data = synthetic::generate(
        config.n_samples,
        config.seed,
        config.target_noise,
        &CategoryTable::lexical(),
    )?;
    train(data, SYNTHETIC_SOURCE, config)
}
