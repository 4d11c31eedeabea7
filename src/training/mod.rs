//! Model training
//!
//! - `synthetic.rs` - Seeded synthetic readings and targets
//! - `dataset.rs` - Training rows, CSV loading (polars), holdout split
//! - `evaluation.rs` - RMSE / R² per output
//! - `trainer.rs` - End-to-end training into a sealed artifact

pub mod synthetic;
pub mod dataset;
pub mod evaluation;
pub mod trainer;

pub use dataset::TrainingSet;
pub use evaluation::{EvaluationReport, OutputMetrics};
pub use trainer::{train, train_synthetic, SYNTHETIC_SOURCE};
