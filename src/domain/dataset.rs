//! Tabular training data: CSV loading, label encoding and the train/test split.

use crate::domain::error::TrainingError;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

/// A CSV file held as strings until columns are chosen.
#[derive(Debug, Clone)]
pub struct TabularDataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Numeric features plus encoded targets, ready to fit.
#[derive(Debug, Clone)]
pub struct LabeledData {
    pub records: Array2<f64>,
    pub targets: Array1<usize>,
    pub feature_names: Vec<String>,
    pub classes: Vec<String>,
}

impl TabularDataset {
    pub fn from_path(path: &Path) -> Result<Self, TrainingError> {
        let file = std::fs::File::open(path).map_err(|e| {
            TrainingError::Dataset(format!("cannot open {}: {}", path.display(), e))
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TrainingError> {
        let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = csv.headers()?.iter().map(str::to_string).collect();
        let rows = csv
            .records()
            .map(|r| r.map(|rec| rec.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;
        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Result<usize, TrainingError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TrainingError::MissingColumn(name.to_string()))
    }

    /// Extracts `features` as numbers and label-encodes `target`.
    pub fn select(&self, target: &str, features: &[String]) -> Result<LabeledData, TrainingError> {
        if features.is_empty() {
            return Err(TrainingError::Dataset("no feature columns selected".to_string()));
        }
        if features.iter().any(|f| f == target) {
            return Err(TrainingError::Dataset(format!(
                "target column '{}' cannot also be a feature",
                target
            )));
        }
        if self.rows.is_empty() {
            return Err(TrainingError::Dataset("dataset has no rows".to_string()));
        }

        let target_idx = self.column_index(target)?;
        let feature_idx = features
            .iter()
            .map(|f| self.column_index(f))
            .collect::<Result<Vec<_>, _>>()?;

        let mut values = Vec::with_capacity(self.rows.len() * features.len());
        for (row_no, row) in self.rows.iter().enumerate() {
            for (&col, name) in feature_idx.iter().zip(features) {
                let raw = row.get(col).map(String::as_str).unwrap_or("");
                let v: f64 = raw.parse().map_err(|_| TrainingError::NonNumeric {
                    column: name.clone(),
                    row: row_no + 1,
                    value: raw.to_string(),
                })?;
                values.push(v);
            }
        }
        let records = Array2::from_shape_vec((self.rows.len(), features.len()), values)
            .map_err(|e| TrainingError::Dataset(e.to_string()))?;

        let raw_targets: Vec<&str> = self
            .rows
            .iter()
            .map(|row| row.get(target_idx).map(String::as_str).unwrap_or(""))
            .collect();
        let encoder = LabelEncoder::fit(raw_targets.iter().copied());
        let targets = Array1::from_vec(
            raw_targets
                .iter()
                .filter_map(|v| encoder.transform(v))
                .collect(),
        );

        Ok(LabeledData {
            records,
            targets,
            feature_names: features.to_vec(),
            classes: encoder.classes,
        })
    }
}

/// Maps string labels to `0..k` in sorted order, like scikit-learn's `LabelEncoder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let unique: BTreeSet<&str> = values.into_iter().collect();
        Self {
            classes: unique.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn transform(&self, value: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(value)).ok()
    }
}

#[derive(Debug, Clone)]
pub struct Split {
    pub train_records: Array2<f64>,
    pub train_targets: Array1<usize>,
    pub test_records: Array2<f64>,
    pub test_targets: Array1<usize>,
}

/// Shuffles rows with a seeded generator and holds out `ceil(test_size * n)` of them.
pub fn train_test_split(
    records: &Array2<f64>,
    targets: &Array1<usize>,
    test_size: f64,
    seed: u64,
) -> Split {
    let n = records.nrows();
    let n_test = ((n as f64) * test_size).ceil().min(n as f64) as usize;

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let (test_idx, train_idx) = order.split_at(n_test);

    Split {
        train_records: records.select(Axis(0), train_idx),
        train_targets: targets.select(Axis(0), train_idx),
        test_records: records.select(Axis(0), test_idx),
        test_targets: targets.select(Axis(0), test_idx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Id,A,B,Species\n\
                       1,1.0,2.0,beta\n\
                       2,1.5,2.5,alpha\n\
                       3,9.0,8.0,gamma\n\
                       4,1.2,2.1,beta\n\
                       5,8.5,7.5,gamma\n";

    #[test]
    fn encodes_labels_in_sorted_order() {
        let ds = TabularDataset::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(ds.len(), 5);
        let data = ds.select("Species", &["A".into(), "B".into()]).unwrap();
        assert_eq!(data.classes, vec!["alpha", "beta", "gamma"]);
        assert_eq!(data.targets.to_vec(), vec![1, 0, 2, 1, 2]);
        assert_eq!(data.records.dim(), (5, 2));
        assert_eq!(data.records[[2, 1]], 8.0);
    }

    #[test]
    fn rejects_bad_column_choices() {
        let ds = TabularDataset::from_reader(CSV.as_bytes()).unwrap();
        assert!(matches!(
            ds.select("Species", &["C".into()]),
            Err(TrainingError::MissingColumn(c)) if c == "C"
        ));
        assert!(matches!(
            ds.select("A", &["Species".into()]),
            Err(TrainingError::NonNumeric { row: 1, .. })
        ));
        assert!(ds.select("A", &["A".into()]).is_err());
        assert!(ds.select("Species", &[]).is_err());
    }

    #[test]
    fn split_is_eighty_twenty_and_reproducible() {
        let records = Array2::from_shape_fn((150, 2), |(i, j)| (i * 2 + j) as f64);
        let targets = Array1::from_shape_fn(150, |i| i % 3);
        let a = train_test_split(&records, &targets, 0.2, 42);
        let b = train_test_split(&records, &targets, 0.2, 42);
        assert_eq!(a.test_records.nrows(), 30);
        assert_eq!(a.train_records.nrows(), 120);
        assert_eq!(a.test_records, b.test_records);
        assert_eq!(a.train_targets, b.train_targets);

        let c = train_test_split(&records, &targets, 0.2, 7);
        assert_ne!(a.test_records, c.test_records);
    }

    #[test]
    fn test_size_rounds_up() {
        let records = Array2::<f64>::zeros((11, 1));
        let targets = Array1::<usize>::zeros(11);
        let split = train_test_split(&records, &targets, 0.2, 1);
        assert_eq!(split.test_records.nrows(), 3);
        assert_eq!(split.train_records.nrows(), 8);
    }
}
