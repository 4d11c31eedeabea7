//! Holdout evaluation (RMSE and R² per output)

use serde::{Deserialize, Serialize};

use crate::model::{N_OUTPUTS, OUTPUT_NAMES};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputMetrics {
    pub output: String,
    pub rmse: f64,
    pub r2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub n_samples: usize,
    pub outputs: Vec<OutputMetrics>,
}

impl EvaluationReport {
    /// `predicted` and `actual` must have equal, non-zero length
    pub fn compute(predicted: &[[f64; N_OUTPUTS]], actual: &[[f64; N_OUTPUTS]]) -> Self {
        let n = predicted.len().min(actual.len());
        let outputs = (0..N_OUTPUTS)
            .map(|o| {
                let mean = actual[..n].iter().map(|a| a[o]).sum::<f64>() / n.max(1) as f64;
                let (sse, sst) = predicted[..n]
                    .iter()
                    .zip(&actual[..n])
                    .fold((0.0, 0.0), |(sse, sst), (p, a)| {
                        (sse + (p[o] - a[o]).powi(2), sst + (a[o] - mean).powi(2))
                    });

                // Constant targets: perfect if matched exactly, otherwise no skill
                let r2 = if sst > 0.0 {
                    1.0 - sse / sst
                } else if sse == 0.0 {
                    1.0
                } else {
                    0.0
                };

                OutputMetrics {
                    output: OUTPUT_NAMES[o].to_string(),
                    rmse: (sse / n.max(1) as f64).sqrt(),
                    r2,
                }
            })
            .collect();

        Self { n_samples: n, outputs }
    }

    pub fn metrics(&self, output: &str) -> Option<&OutputMetrics> {
        self.outputs.iter().find(|m| m.output == output)
    }
}
