//! The prediction service.
//!
//! This module sits between the HTTP layer, the model registry and the
//! prediction store. It is responsible for:
//! 1.  Validating the feature vector and resolving the requested model.
//! 2.  Running inference on the shared, read-only classifier handle.
//! 3.  Recording each successful inference, best-effort.
//! 4.  Listing and clearing the recorded history.

use crate::domain::error::PredictionError;
use crate::domain::model::{ModelName, ModelRegistry};
use crate::domain::prediction::{ClassLabel, FeatureVector, PredictionRecord};
use crate::storage::PredictionStore;
use std::sync::Arc;

/// Result of one successful inference.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutcome {
    pub label: ClassLabel,
    pub model: ModelName,
    pub probabilities: Option<Vec<f64>>,
    /// False when the record could not be written to the store.
    pub recorded: bool,
}

pub struct PredictionService {
    registry: Arc<ModelRegistry>,
    store: Arc<dyn PredictionStore>,
}

impl PredictionService {
    pub fn new(registry: Arc<ModelRegistry>, store: Arc<dyn PredictionStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn PredictionStore> {
        &self.store
    }

    /// Classifies one sample with the named model and records the result.
    ///
    /// Nothing is recorded when validation or model resolution fails. A store
    /// failure after inference is logged and does not fail the call.
    pub async fn predict(
        &self,
        features: Vec<f64>,
        model_name: &str,
    ) -> Result<PredictionOutcome, PredictionError> {
        let features = FeatureVector::try_from(features)?;
        let (model, classifier) = self.registry.resolve(model_name)?;

        if classifier.n_features() != features.as_slice().len() {
            return Err(PredictionError::invalid_input(format!(
                "model '{}' expects {} features, got {}",
                model,
                classifier.n_features(),
                features.as_slice().len()
            )));
        }

        let label = ClassLabel::try_from(classifier.predict(features.as_slice()))?;
        let probabilities = classifier.predict_proba(features.as_slice());

        let record = PredictionRecord::new(features, label, model);
        let recorded = match self.store.append(&record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(model = %model, error = %e, "prediction served but not recorded");
                false
            }
        };

        tracing::debug!(model = %model, label = %label, recorded, "prediction served");
        Ok(PredictionOutcome {
            label,
            model,
            probabilities,
            recorded,
        })
    }

    pub async fn history(&self) -> Result<Vec<PredictionRecord>, PredictionError> {
        self.store
            .list()
            .await
            .map_err(|e| PredictionError::PersistenceUnavailable {
                message: e.to_string(),
            })
    }

    /// Deletes all recorded predictions and returns the number removed.
    pub async fn clear_history(&self) -> Result<u64, PredictionError> {
        let removed = self
            .store
            .clear()
            .await
            .map_err(|e| PredictionError::PersistenceUnavailable {
                message: e.to_string(),
            })?;
        tracing::info!(removed, "prediction history cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Classifier;
    use crate::storage::{InMemoryPredictionStore, StoreError};
    use async_trait::async_trait;

    struct Threshold {
        n_features: usize,
    }

    impl Classifier for Threshold {
        fn n_features(&self) -> usize {
            self.n_features
        }
        fn n_classes(&self) -> usize {
            3
        }
        fn predict(&self, features: &[f64]) -> usize {
            if features[2] < 2.5 {
                0
            } else if features[2] < 5.0 {
                1
            } else {
                2
            }
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl PredictionStore for BrokenStore {
        async fn append(&self, _record: &PredictionRecord) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn list(&self) -> Result<Vec<PredictionRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn clear(&self) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    fn registry() -> Arc<ModelRegistry> {
        let mut reg = ModelRegistry::new();
        reg.register(ModelName::DecisionTree, Arc::new(Threshold { n_features: 4 }));
        reg.register(ModelName::Svm, Arc::new(Threshold { n_features: 2 }));
        Arc::new(reg)
    }

    #[tokio::test]
    async fn records_successful_predictions_only() {
        let store = Arc::new(InMemoryPredictionStore::new());
        let service = PredictionService::new(registry(), store.clone());

        let out = service
            .predict(vec![6.3, 3.3, 6.0, 2.5], "decision_tree")
            .await
            .unwrap();
        assert_eq!(out.label, ClassLabel::IrisVirginica);
        assert!(out.recorded);

        assert!(matches!(
            service.predict(vec![1.0, 2.0], "decision_tree").await,
            Err(PredictionError::InvalidInput { .. })
        ));
        assert!(matches!(
            service.predict(vec![1.0; 4], "unknown").await,
            Err(PredictionError::ModelNotFound { .. })
        ));
        assert!(matches!(
            service.predict(vec![1.0; 4], "random_forest").await,
            Err(PredictionError::ModelNotFound { .. })
        ));
        // Model fitted on two columns cannot serve a four-column request.
        assert!(matches!(
            service.predict(vec![1.0; 4], "svm").await,
            Err(PredictionError::InvalidInput { .. })
        ));

        let history = service.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].prediction, 2);
        assert_eq!(history[0].model, ModelName::DecisionTree);
    }

    #[tokio::test]
    async fn store_outage_does_not_fail_inference() {
        let service = PredictionService::new(registry(), Arc::new(BrokenStore));
        let out = service
            .predict(vec![5.1, 3.5, 1.4, 0.2], "decision_tree")
            .await
            .unwrap();
        assert_eq!(out.label, ClassLabel::IrisSetosa);
        assert!(!out.recorded);

        assert!(matches!(
            service.history().await,
            Err(PredictionError::PersistenceUnavailable { .. })
        ));
        assert!(matches!(
            service.clear_history().await,
            Err(PredictionError::PersistenceUnavailable { .. })
        ));
    }
}
