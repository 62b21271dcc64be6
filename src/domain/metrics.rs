//! Held-out evaluation: accuracy, confusion matrix and per-class report.

use crate::domain::model::ModelName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClassReport {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// Number of true samples of this class in the evaluation set.
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EvaluationReport {
    pub model: ModelName,
    pub accuracy: f64,
    /// Rows are actual classes, columns predicted classes.
    pub confusion_matrix: Vec<Vec<usize>>,
    pub per_class: Vec<ClassReport>,
    pub train_size: usize,
    pub test_size: usize,
    pub trained_at: DateTime<Utc>,
}

impl EvaluationReport {
    pub fn compute(
        model: ModelName,
        labels: &[String],
        actual: &[usize],
        predicted: &[usize],
        train_size: usize,
    ) -> Self {
        let matrix = confusion_matrix(labels.len(), actual, predicted);
        Self {
            model,
            accuracy: accuracy(actual, predicted),
            per_class: class_reports(labels, &matrix),
            confusion_matrix: matrix,
            train_size,
            test_size: actual.len(),
            trained_at: Utc::now(),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let bytes = serde_json::to_vec_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, bytes)
    }

    /// Reads a report; `Ok(None)` when no report exists at `path`.
    pub fn load(path: &Path) -> std::io::Result<Option<Self>> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(std::io::Error::other)
    }
}

/// Fraction of positions where `actual` and `predicted` agree; 0 for empty input.
pub fn accuracy(actual: &[usize], predicted: &[usize]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let correct = actual
        .iter()
        .zip(predicted)
        .filter(|(a, p)| a == p)
        .count();
    correct as f64 / actual.len() as f64
}

/// `n_classes × n_classes` counts; labels outside the range are ignored.
pub fn confusion_matrix(
    n_classes: usize,
    actual: &[usize],
    predicted: &[usize],
) -> Vec<Vec<usize>> {
    let mut matrix = vec![vec![0; n_classes]; n_classes];
    for (&a, &p) in actual.iter().zip(predicted) {
        if a < n_classes && p < n_classes {
            matrix[a][p] += 1;
        }
    }
    matrix
}

fn class_reports(labels: &[String], matrix: &[Vec<usize>]) -> Vec<ClassReport> {
    labels
        .iter()
        .enumerate()
        .map(|(k, label)| {
            let tp = matrix[k][k] as f64;
            let support: usize = matrix[k].iter().sum();
            let predicted: usize = matrix.iter().map(|row| row[k]).sum();
            let precision = ratio(tp, predicted as f64);
            let recall = ratio(tp, support as f64);
            ClassReport {
                label: label.clone(),
                precision,
                recall,
                f1_score: ratio(2.0 * precision * recall, precision + recall),
                support,
            }
        })
        .collect()
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    #[test]
    fn matches_a_known_classification_report() {
        let y_true = [0, 1, 2, 1, 0, 2, 1, 0, 2, 2];
        let y_pred = [0, 1, 2, 1, 0, 2, 2, 0, 1, 2];
        let report = EvaluationReport::compute(ModelName::Svm, &labels(), &y_true, &y_pred, 40);

        assert!((report.accuracy - 0.8).abs() < 1e-12);
        assert_eq!(
            report.confusion_matrix,
            vec![vec![3, 0, 0], vec![0, 2, 1], vec![0, 1, 3]]
        );
        let b = &report.per_class[1];
        assert!((b.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((b.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(b.support, 3);
        assert_eq!(report.per_class[0].f1_score, 1.0);
        assert_eq!(report.test_size, 10);
    }

    #[test]
    fn empty_inputs_do_not_divide_by_zero() {
        assert_eq!(accuracy(&[], &[]), 0.0);
        let report = EvaluationReport::compute(ModelName::Svm, &labels(), &[], &[], 0);
        assert!(report.per_class.iter().all(|c| c.precision == 0.0 && c.f1_score == 0.0));
    }

    #[test]
    fn missing_report_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EvaluationReport::load(&dir.path().join("nope.json")).unwrap().is_none());
    }
}
