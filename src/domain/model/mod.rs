//! Model names, the classifier contract and the artifact naming scheme.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

pub mod artifact;
pub mod registry;

pub use artifact::{ArtifactError, FittedClassifier, ModelArtifact};
pub use registry::{ArtifactLoadFailure, ModelRegistry};

/// The closed set of algorithms the service can serve.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ModelName {
    RandomForest,
    Svm,
    DecisionTree,
    Xgboost,
}

impl ModelName {
    pub const ALL: [ModelName; 4] = [
        ModelName::RandomForest,
        ModelName::Svm,
        ModelName::DecisionTree,
        ModelName::Xgboost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelName::RandomForest => "random_forest",
            ModelName::Svm => "svm",
            ModelName::DecisionTree => "decision_tree",
            ModelName::Xgboost => "xgboost",
        }
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModelName(pub String);

impl fmt::Display for UnknownModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown model name '{}'", self.0)
    }
}

impl std::error::Error for UnknownModelName {}

impl FromStr for ModelName {
    type Err = UnknownModelName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ModelName::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| UnknownModelName(s.to_string()))
    }
}

/// File name of the serialized classifier for `model`.
///
/// The trainer writes to this name and the registry reads from it.
pub fn artifact_file_name(model: ModelName) -> String {
    format!("{}_model.json", model.as_str())
}

/// File name of the held-out evaluation report written next to the artifact.
pub fn metrics_file_name(model: ModelName) -> String {
    format!("{}_metrics.json", model.as_str())
}

/// A fitted, immutable classifier.
///
/// Implementations are shared read-only across request handlers.
pub trait Classifier: Send + Sync {
    /// Number of input features the classifier was fitted on.
    fn n_features(&self) -> usize;

    /// Number of classes the classifier can emit.
    fn n_classes(&self) -> usize;

    /// Returns the class index for one sample.
    /// Callers guarantee `features.len() == self.n_features()`.
    fn predict(&self, features: &[f64]) -> usize;

    /// Optional class-probability vector of length `n_classes()`.
    fn predict_proba(&self, _features: &[f64]) -> Option<Vec<f64>> {
        None
    }
}
