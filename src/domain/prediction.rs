//! Core prediction types shared by the service, the store and the trainer.

use crate::domain::error::PredictionError;
use crate::domain::model::ModelName;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Number of measurements in a feature vector.
pub const FEATURE_COUNT: usize = 4;

/// Measurement names, in feature-vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] =
    ["sepal_length", "sepal_width", "petal_length", "petal_width"];

/// Class names indexed by label. The trainer's label encoder produces the same order.
pub const CLASS_NAMES: [&str; 3] = ["Iris-setosa", "Iris-versicolor", "Iris-virginica"];

/// Four flower measurements: sepal length, sepal width, petal length, petal width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
#[schema(value_type = Vec<f64>)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl TryFrom<Vec<f64>> for FeatureVector {
    type Error = PredictionError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        let got = values.len();
        let array: [f64; FEATURE_COUNT] = values.try_into().map_err(|_| {
            PredictionError::invalid_input(format!(
                "expected {} features ({}), got {}",
                FEATURE_COUNT,
                FEATURE_NAMES.join(", "),
                got
            ))
        })?;
        Ok(Self(array))
    }
}

impl From<FeatureVector> for Vec<f64> {
    fn from(v: FeatureVector) -> Self {
        v.0.to_vec()
    }
}

/// Iris species predicted by a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassLabel {
    IrisSetosa = 0,
    IrisVersicolor = 1,
    IrisVirginica = 2,
}

impl ClassLabel {
    pub const ALL: [ClassLabel; 3] = [
        ClassLabel::IrisSetosa,
        ClassLabel::IrisVersicolor,
        ClassLabel::IrisVirginica,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        CLASS_NAMES[self as usize]
    }
}

impl TryFrom<usize> for ClassLabel {
    type Error = PredictionError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        ClassLabel::ALL
            .get(index)
            .copied()
            .ok_or_else(|| PredictionError::Inference {
                message: format!("classifier produced out-of-range label {}", index),
            })
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One stored inference: what was asked and what was answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictionRecord {
    pub features: FeatureVector,
    pub prediction: u8,
    pub model: ModelName,
}

impl PredictionRecord {
    pub fn new(features: FeatureVector, label: ClassLabel, model: ModelName) -> Self {
        Self {
            features,
            prediction: label.index(),
            model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_vector_requires_four_values() {
        assert!(FeatureVector::try_from(vec![5.1, 3.5, 1.4, 0.2]).is_ok());
        assert!(matches!(
            FeatureVector::try_from(vec![5.1, 3.5, 1.4]),
            Err(PredictionError::InvalidInput { .. })
        ));
        assert!(FeatureVector::try_from(vec![1.0; 5]).is_err());
        assert!(FeatureVector::try_from(Vec::new()).is_err());
    }

    #[test]
    fn feature_vector_serializes_as_plain_array() {
        let v = FeatureVector::new([5.1, 3.5, 1.4, 0.2]);
        assert_eq!(serde_json::to_string(&v).unwrap(), "[5.1,3.5,1.4,0.2]");
        let bad: Result<FeatureVector, _> = serde_json::from_str("[1.0, 2.0]");
        assert!(bad.is_err());
    }

    #[test]
    fn class_labels_match_names() {
        assert_eq!(ClassLabel::try_from(0).unwrap().name(), "Iris-setosa");
        assert_eq!(ClassLabel::try_from(2).unwrap(), ClassLabel::IrisVirginica);
        assert!(ClassLabel::try_from(3).is_err());
    }
}
