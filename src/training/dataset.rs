//! Labelled training rows and CSV loading

use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use crate::features::{encode, CategoryTable, FeatureVector, PredictionRequest, RangePolicy};
use crate::model::{N_OUTPUTS, OUTPUT_NAMES};

/// Input columns, in `PredictionRequest` order
pub const INPUT_COLUMNS: [&str; 4] = ["ph_value", "ec_value", "water_temperature", "air_humidity"];
pub const VISUAL_COLUMN: &str = "visual_condition";

/// Encoded rows and their health/growth/yield targets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub rows: Vec<FeatureVector>,
    pub targets: Vec<[f64; N_OUTPUTS]>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Load a labelled CSV. Every row is validated with the request encoder
    /// under the reject policy.
    pub fn from_csv(path: impl AsRef<Path>, categories: &CategoryTable) -> Result<Self> {
        let path = path.as_ref();
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.into()))
            .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
            .finish()
            .with_context(|| format!("Failed to load training CSV: {}", path.display()))?;

        let inputs = INPUT_COLUMNS
            .iter()
            .map(|name| f64_column(&df, name))
            .collect::<Result<Vec<_>>>()?;
        let outputs = OUTPUT_NAMES
            .iter()
            .map(|name| f64_column(&df, name))
            .collect::<Result<Vec<_>>>()?;
        let visual = df
            .column(VISUAL_COLUMN)
            .with_context(|| format!("Column '{}' not found", VISUAL_COLUMN))?
            .str()
            .with_context(|| format!("Column '{}' is not string type", VISUAL_COLUMN))?;

        let mut set = TrainingSet::default();
        for idx in 0..df.height() {
            let value = |column: &Vec<Option<f64>>, name: &str| {
                column[idx].with_context(|| format!("Row {}: missing {}", idx, name))
            };

            let request = PredictionRequest::new(
                value(&inputs[0], INPUT_COLUMNS[0])?,
                value(&inputs[1], INPUT_COLUMNS[1])?,
                value(&inputs[2], INPUT_COLUMNS[2])?,
                value(&inputs[3], INPUT_COLUMNS[3])?,
                visual
                    .get(idx)
                    .with_context(|| format!("Row {}: missing {}", idx, VISUAL_COLUMN))?,
            );
            let encoded = encode(&request, categories, RangePolicy::Reject)
                .with_context(|| format!("Row {}: invalid input", idx))?;

            let mut target = [0.0; N_OUTPUTS];
            for (o, column) in outputs.iter().enumerate() {
                let t = value(column, OUTPUT_NAMES[o])?;
                if !(0.0..=1.0).contains(&t) {
                    bail!("Row {}: {} = {} is outside [0, 1]", idx, OUTPUT_NAMES[o], t);
                }
                target[o] = t;
            }

            set.rows.push(encoded.features);
            set.targets.push(target);
        }

        info!(path = %path.display(), rows = set.len(), "Loaded training CSV");
        Ok(set)
    }

    /// Deterministic shuffled split into (train, holdout)
    pub fn split(self, holdout_fraction: f64, seed: u64) -> Result<(TrainingSet, TrainingSet)> {
        ensure!(
            (0.0..1.0).contains(&holdout_fraction),
            "holdout fraction must be in [0, 1), got {}",
            holdout_fraction
        );
        ensure!(!self.is_empty(), "training set is empty");

        let n = self.len();
        let n_holdout = ((n as f64) * holdout_fraction).round() as usize;
        let n_holdout = n_holdout.min(n - 1);

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));

        let mut train = TrainingSet::default();
        let mut holdout = TrainingSet::default();
        for (pos, &i) in order.iter().enumerate() {
            let target = if pos < n_holdout { &mut holdout } else { &mut train };
            target.rows.push(self.rows[i]);
            target.targets.push(self.targets[i]);
        }
        Ok((train, holdout))
    }
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", name))?;
    let values = column
        .f64()
        .with_context(|| format!("Column '{}' is not f64 after cast", name))?;
    Ok(values.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "ph_value,ec_value,water_temperature,air_humidity,visual_condition,health_score,growth_score,yield_score";

    fn write_csv(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_from_csv_encodes_rows() {
        let file = write_csv(&[
            "6.0,1200,21.0,60,Healthy,0.95,0.9,0.8",
            "4.2,2600,31.5,40,Leaf Curling,0.2,0.15,0.1",
        ]);
        let set = TrainingSet::from_csv(file.path(), &CategoryTable::lexical()).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.rows[0].0, [6.0, 1200.0, 21.0, 60.0, 0.0]);
        assert_eq!(set.rows[1].0[4], 1.0);
        assert_eq!(set.targets[1], [0.2, 0.15, 0.1]);
    }

    #[test]
    fn test_from_csv_rejects_unknown_label_with_row() {
        let file = write_csv(&[
            "6.0,1200,21.0,60,Healthy,0.95,0.9,0.8",
            "6.0,1200,21.0,60,Purple,0.95,0.9,0.8",
        ]);
        let err = TrainingSet::from_csv(file.path(), &CategoryTable::lexical()).unwrap_err();
        assert!(format!("{:#}", err).contains("Row 1"));
    }

    #[test]
    fn test_from_csv_rejects_out_of_domain() {
        let file = write_csv(&["9.5,1200,21.0,60,Healthy,0.95,0.9,0.8"]);
        let err = TrainingSet::from_csv(file.path(), &CategoryTable::lexical()).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("Row 0"));
        assert!(msg.contains("ph_value"));
    }

    #[test]
    fn test_from_csv_missing_column() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "ph_value,ec_value").unwrap();
        writeln!(file, "6.0,1200").unwrap();
        file.flush().unwrap();
        assert!(TrainingSet::from_csv(file.path(), &CategoryTable::lexical()).is_err());
    }

    #[test]
    fn test_split_is_deterministic_and_disjoint() {
        let set = TrainingSet {
            rows: (0..10).map(|i| FeatureVector([i as f64, 0.0, 0.0, 0.0, 0.0])).collect(),
            targets: vec![[0.5; N_OUTPUTS]; 10],
        };
        let (train_a, hold_a) = set.clone().split(0.2, 3).unwrap();
        let (train_b, hold_b) = set.split(0.2, 3).unwrap();

        assert_eq!(hold_a.len(), 2);
        assert_eq!(train_a.len(), 8);
        assert_eq!(hold_a, hold_b);
        assert_eq!(train_a, train_b);
        for row in &hold_a.rows {
            assert!(!train_a.rows.contains(row));
        }
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let set = TrainingSet {
            rows: vec![FeatureVector([0.0; 5])],
            targets: vec![[0.0; N_OUTPUTS]],
        };
        assert!(set.clone().split(1.0, 0).is_err());
        let (train, holdout) = set.split(0.5, 0).unwrap();
        assert_eq!(train.len(), 1);
        assert!(holdout.is_empty());
    }
}
