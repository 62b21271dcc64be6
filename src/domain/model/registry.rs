//! ModelRegistry for mapping model names to loaded classifiers.

use crate::domain::error::{ModelUnavailable, PredictionError};
use crate::domain::metrics::EvaluationReport;
use crate::domain::model::artifact::{ArtifactError, ModelArtifact};
use crate::domain::model::{artifact_file_name, metrics_file_name, Classifier, ModelName};
use crate::domain::prediction::CLASS_NAMES;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

struct RegisteredModel {
    classifier: Arc<dyn Classifier>,
    evaluation: Option<EvaluationReport>,
}

/// An artifact that could not be loaded at startup.
#[derive(Debug)]
pub struct ArtifactLoadFailure {
    pub model: ModelName,
    pub error: ArtifactError,
}

/// Immutable map from model name to classifier handle, built once at startup.
pub struct ModelRegistry {
    models: HashMap<ModelName, RegisteredModel>,
}

impl ModelRegistry {
    /// Creates a new empty ModelRegistry.
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Registers a classifier under the given name, replacing any previous one.
    pub fn register(&mut self, name: ModelName, classifier: Arc<dyn Classifier>) {
        self.models.insert(
            name,
            RegisteredModel {
                classifier,
                evaluation: None,
            },
        );
    }

    /// Attaches a held-out evaluation report to an already registered model.
    pub fn attach_evaluation(&mut self, name: ModelName, report: EvaluationReport) {
        if let Some(entry) = self.models.get_mut(&name) {
            entry.evaluation = Some(report);
        }
    }

    /// Retrieves a classifier by name.
    /// Returns None if the model is not loaded.
    pub fn get(&self, name: ModelName) -> Option<Arc<dyn Classifier>> {
        self.models.get(&name).map(|m| m.classifier.clone())
    }

    /// Resolves a client-supplied name to a classifier handle.
    pub fn resolve(
        &self,
        raw_name: &str,
    ) -> Result<(ModelName, Arc<dyn Classifier>), PredictionError> {
        let name: ModelName = raw_name.parse().map_err(|_| {
            PredictionError::model_not_found(raw_name, ModelUnavailable::UnknownModel)
        })?;
        self.get(name).map(|handle| (name, handle)).ok_or_else(|| {
            PredictionError::model_not_found(raw_name, ModelUnavailable::NotLoaded(name))
        })
    }

    pub fn evaluation(&self, name: ModelName) -> Option<&EvaluationReport> {
        self.models.get(&name).and_then(|m| m.evaluation.as_ref())
    }

    pub fn is_loaded(&self, name: ModelName) -> bool {
        self.models.contains_key(&name)
    }

    /// Returns loaded model names in canonical order.
    pub fn list_models(&self) -> Vec<ModelName> {
        ModelName::ALL
            .into_iter()
            .filter(|m| self.models.contains_key(m))
            .collect()
    }

    /// Loads every known artifact from `dir`.
    ///
    /// A missing or unreadable artifact never aborts loading of the others; it is
    /// logged and reported back so the caller can decide how loudly to complain.
    pub fn load_from_dir(dir: &Path) -> (Self, Vec<ArtifactLoadFailure>) {
        let mut reg = ModelRegistry::new();
        let mut failures = Vec::new();

        for name in ModelName::ALL {
            let artifact = match ModelArtifact::load(dir, name) {
                Ok(a) => a,
                Err(error) => {
                    tracing::warn!(model = %name, %error, "skipping model artifact");
                    failures.push(ArtifactLoadFailure { model: name, error });
                    continue;
                }
            };

            if artifact.classes != CLASS_NAMES {
                let error = ArtifactError::ClassMismatch {
                    path: dir.join(artifact_file_name(name)),
                    expected: CLASS_NAMES.iter().map(|c| c.to_string()).collect(),
                    found: artifact.classes,
                };
                tracing::warn!(model = %name, %error, "skipping model artifact");
                failures.push(ArtifactLoadFailure { model: name, error });
                continue;
            }

            let handle = artifact.classifier.into_handle();
            tracing::info!(
                model = %name,
                n_features = handle.n_features(),
                n_classes = handle.n_classes(),
                "loaded model artifact"
            );
            reg.register(name, handle);

            let report_path = dir.join(metrics_file_name(name));
            match EvaluationReport::load(&report_path) {
                Ok(Some(report)) => reg.attach_evaluation(name, report),
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    model = %name,
                    error = %e,
                    "ignoring unreadable evaluation report"
                ),
            }
        }

        (reg, failures)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(usize);

    impl Classifier for Constant {
        fn n_features(&self) -> usize {
            4
        }
        fn n_classes(&self) -> usize {
            3
        }
        fn predict(&self, _features: &[f64]) -> usize {
            self.0
        }
    }

    #[test]
    fn resolve_distinguishes_unknown_from_unloaded() {
        let mut reg = ModelRegistry::new();
        reg.register(ModelName::Svm, Arc::new(Constant(1)));

        let (name, handle) = reg.resolve("svm").unwrap();
        assert_eq!(name, ModelName::Svm);
        assert_eq!(handle.predict(&[0.0; 4]), 1);

        match reg.resolve("unknown") {
            Err(PredictionError::ModelNotFound { reason, .. }) => {
                assert_eq!(reason, ModelUnavailable::UnknownModel)
            }
            other => panic!("unexpected: {:?}", other.map(|(n, _)| n)),
        }
        match reg.resolve("xgboost") {
            Err(PredictionError::ModelNotFound { reason, .. }) => {
                assert_eq!(reason, ModelUnavailable::NotLoaded(ModelName::Xgboost))
            }
            other => panic!("unexpected: {:?}", other.map(|(n, _)| n)),
        }
    }

    #[test]
    fn empty_directory_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (reg, failures) = ModelRegistry::load_from_dir(dir.path());
        assert!(reg.list_models().is_empty());
        assert_eq!(failures.len(), ModelName::ALL.len());
        assert!(failures
            .iter()
            .all(|f| matches!(f.error, ArtifactError::Missing(_))));
    }
}
