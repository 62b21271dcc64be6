pub mod app;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::prediction_service::{PredictionOutcome, PredictionService};
pub use app::training::{train, train_and_save, TrainingAlgorithm, TrainingJob};
pub use domain::error::{PredictionError, TrainingError};
pub use domain::model::{Classifier, ModelArtifact, ModelName, ModelRegistry};
pub use storage::{InMemoryPredictionStore, PostgresPredictionStore, PredictionStore};
