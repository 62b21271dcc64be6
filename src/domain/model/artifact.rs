//! On-disk representation of a fitted classifier.
//!
//! Artifacts are JSON documents written by the trainer and read by the
//! registry. The `classifier` field is tagged by algorithm so a file can never
//! be loaded as the wrong model type.

use crate::domain::classifier::{
    DecisionTreeClassifier, GradientBoostingClassifier, RandomForestClassifier, SvmClassifier,
};
use crate::domain::model::{artifact_file_name, Classifier, ModelName};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact {0} does not exist")]
    Missing(PathBuf),

    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact {path} holds a {found} classifier, expected {expected}")]
    Mismatch {
        path: PathBuf,
        expected: ModelName,
        found: ModelName,
    },

    #[error("artifact {path} has format version {found}, expected {expected}")]
    UnsupportedVersion {
        path: PathBuf,
        expected: u32,
        found: u32,
    },

    #[error("artifact {path} is malformed: {message}")]
    Invalid { path: PathBuf, message: String },

    #[error("artifact {path} predicts classes {found:?}, expected {expected:?}")]
    ClassMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Fitted model for one of the four algorithms.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum FittedClassifier {
    RandomForest(RandomForestClassifier),
    Svm(SvmClassifier),
    DecisionTree(DecisionTreeClassifier),
    Xgboost(GradientBoostingClassifier),
}

impl FittedClassifier {
    pub fn model_name(&self) -> ModelName {
        match self {
            FittedClassifier::RandomForest(_) => ModelName::RandomForest,
            FittedClassifier::Svm(_) => ModelName::Svm,
            FittedClassifier::DecisionTree(_) => ModelName::DecisionTree,
            FittedClassifier::Xgboost(_) => ModelName::Xgboost,
        }
    }

    pub fn as_classifier(&self) -> &dyn Classifier {
        match self {
            FittedClassifier::RandomForest(m) => m,
            FittedClassifier::Svm(m) => m,
            FittedClassifier::DecisionTree(m) => m,
            FittedClassifier::Xgboost(m) => m,
        }
    }

    /// Checks that a deserialized model is internally consistent.
    pub fn check_structure(&self) -> Result<(), String> {
        match self {
            FittedClassifier::RandomForest(m) => m.check_structure(),
            FittedClassifier::Svm(m) => m.check_structure(),
            FittedClassifier::DecisionTree(m) => m.check_structure(),
            FittedClassifier::Xgboost(m) => m.check_structure(),
        }
    }

    pub fn into_handle(self) -> Arc<dyn Classifier> {
        match self {
            FittedClassifier::RandomForest(m) => Arc::new(m),
            FittedClassifier::Svm(m) => Arc::new(m),
            FittedClassifier::DecisionTree(m) => Arc::new(m),
            FittedClassifier::Xgboost(m) => Arc::new(m),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// Feature column names, in the order the classifier expects them.
    pub feature_names: Vec<String>,
    /// Class names indexed by encoded label.
    pub classes: Vec<String>,
    pub classifier: FittedClassifier,
}

impl ModelArtifact {
    pub fn new(
        classifier: FittedClassifier,
        feature_names: Vec<String>,
        classes: Vec<String>,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_names,
            classes,
            classifier,
        }
    }

    pub fn model_name(&self) -> ModelName {
        self.classifier.model_name()
    }

    /// Writes the artifact to `dir` under its canonical file name and returns the path.
    pub fn save(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(artifact_file_name(self.model_name()));
        let bytes = serde_json::to_vec(self).map_err(std::io::Error::other)?;
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Reads the artifact for `expected` from `dir`.
    pub fn load(dir: &Path, expected: ModelName) -> Result<Self, ArtifactError> {
        let path = dir.join(artifact_file_name(expected));
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArtifactError::Missing(path))
            }
            Err(source) => return Err(ArtifactError::Io { path, source }),
        };

        let artifact: ModelArtifact = serde_json::from_slice(&bytes)
            .map_err(|source| ArtifactError::Corrupt {
                path: path.clone(),
                source,
            })?;

        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                path,
                expected: ARTIFACT_FORMAT_VERSION,
                found: artifact.format_version,
            });
        }
        if artifact.model_name() != expected {
            return Err(ArtifactError::Mismatch {
                path,
                expected,
                found: artifact.model_name(),
            });
        }

        let classifier = artifact.classifier.as_classifier();
        let declared = (artifact.feature_names.len(), artifact.classes.len());
        if declared != (classifier.n_features(), classifier.n_classes()) {
            return Err(ArtifactError::Invalid {
                path,
                message: format!(
                    "header declares {} features and {} classes, classifier has {} and {}",
                    declared.0,
                    declared.1,
                    classifier.n_features(),
                    classifier.n_classes()
                ),
            });
        }
        if let Err(message) = artifact.classifier.check_structure() {
            return Err(ArtifactError::Invalid { path, message });
        }
        Ok(artifact)
    }
}
