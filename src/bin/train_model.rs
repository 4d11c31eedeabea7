// Model Training Binary
//
// Purpose: Train the plant health ensemble and write the model artifact
// Usage: cargo run --release --bin train_model -- [--config cfg.json] [--data rows.csv]
//        [--out models/hydro_model.json] [--samples N] [--seed N]

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use hydro_health_engine::config::DEFAULT_MODEL_PATH;
use hydro_health_engine::features::CategoryTable;
use hydro_health_engine::{train, train_synthetic, TrainingConfig, TrainingSet};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "Usage: train_model [--config FILE] [--data CSV] [--out PATH] [--samples N] [--seed N]\n\
    \n\
    --config FILE  Training config JSON (defaults apply to missing keys)\n\
    --data CSV     Train on labelled CSV rows instead of synthetic data\n\
    --out PATH     Artifact path (default: models/hydro_model.json)\n\
    --samples N    Synthetic sample count\n\
    --seed N       Seed for sampling and the holdout split\n";

struct Args {
    config: Option<PathBuf>,
    data: Option<PathBuf>,
    out: PathBuf,
    samples: Option<usize>,
    seed: Option<u64>,
}

fn parse_args() -> Result<Option<Args>> {
    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut parsed = Args {
        config: None,
        data: None,
        out: PathBuf::from(DEFAULT_MODEL_PATH),
        samples: None,
        seed: None,
    };

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        if a == "--help" || a == "-h" {
            eprintln!("{}", USAGE);
            return Ok(None);
        }

        let value = match args.first().cloned() {
            Some(v) => {
                args.remove(0);
                v
            }
            None => bail!("{} requires a value\n\n{}", a, USAGE),
        };

        match a.as_str() {
            "--config" => parsed.config = Some(PathBuf::from(value)),
            "--data" => parsed.data = Some(PathBuf::from(value)),
            "--out" => parsed.out = PathBuf::from(value),
            "--samples" => {
                parsed.samples = Some(value.parse().with_context(|| format!("Invalid --samples '{}'", value))?)
            }
            "--seed" => {
                parsed.seed = Some(value.parse().with_context(|| format!("Invalid --seed '{}'", value))?)
            }
            other => bail!("Unknown argument '{}'\n\n{}", other, USAGE),
        }
    }

    Ok(Some(parsed))
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hydro_health_engine=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(args) = parse_args()? else {
        return Ok(());
    };

    let mut config = match &args.config {
        Some(path) => TrainingConfig::from_json_file(path)?,
        None => TrainingConfig::default(),
    };
    if let Some(samples) = args.samples {
        config.n_samples = samples;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let artifact = match &args.data {
        Some(csv) => {
            let data = TrainingSet::from_csv(csv, &CategoryTable::lexical())?;
            train(data, &csv.display().to_string(), &config)?
        }
        None => train_synthetic(&config)?,
    };

    artifact.save(&args.out)?;

    println!("Model version: {}", artifact.model_version);
    println!("Fingerprint:   {}", artifact.fingerprint);
    if let Some(eval) = &artifact.training.evaluation {
        println!("Holdout ({} rows):", eval.n_samples);
        for m in &eval.outputs {
            println!("  {:<14} RMSE {:.4}  R² {:.3}", m.output, m.rmse, m.r2);
        }
    }
    println!("Saved to {}", args.out.display());

    Ok(())
}
