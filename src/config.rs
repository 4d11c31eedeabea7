//! Service and training configuration
//!
//! The server is configured from environment variables (systemd style); the
//! trainer from an optional JSON file plus CLI overrides.

use std::env;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::features::RangePolicy;
use crate::model::{band_constraints, BoostingParams, MonotoneConstraint};

pub const DEFAULT_MODEL_PATH: &str = "models/hydro_model.json";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub range_policy: RangePolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            range_policy: RangePolicy::Reject,
        }
    }
}

impl ServiceConfig {
    /// `MODEL_PATH`, `HOST`, `PORT`, `RANGE_POLICY`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unparseable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let model_path = lookup("MODEL_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);

        Self {
            model_path,
            host: parse_or_default("HOST", lookup("HOST"), defaults.host),
            port: parse_or_default("PORT", lookup("PORT"), defaults.port),
            range_policy: parse_or_default("RANGE_POLICY", lookup("RANGE_POLICY"), defaults.range_policy),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Debug,
{
    match raw {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Invalid {}='{}', using default {:?}", key, raw, default);
                default
            }
        },
    }
}

/// Synthetic-data training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub n_samples: usize,
    pub seed: u64,
    /// Half-width of the uniform noise added to synthetic targets
    pub target_noise: f64,
    /// Fraction of rows held out for evaluation
    pub holdout_fraction: f64,
    pub model_version: Option<String>,
    pub boosting: BoostingParams,
    /// In raw reading units; rescaled with the fitted scaler before boosting
    pub monotone_constraints: Vec<MonotoneConstraint>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_samples: 2000,
            seed: 42,
            target_noise: 0.02,
            holdout_fraction: 0.2,
            model_version: None,
            boosting: BoostingParams::default(),
            monotone_constraints: band_constraints(),
        }
    }
}

impl TrainingConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read training config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse training config {}", path.display()))
    }
}
