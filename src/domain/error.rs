//! Error taxonomy for inference and training.

use crate::domain::model::ModelName;
use thiserror::Error;

/// Why a requested model cannot serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelUnavailable {
    /// Name is outside the closed set of algorithms.
    UnknownModel,
    /// Known algorithm whose artifact did not load at startup.
    NotLoaded(ModelName),
}

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Model '{model}' not found: {}", describe_unavailable(.reason))]
    ModelNotFound {
        model: String,
        reason: ModelUnavailable,
    },

    #[error("Prediction store unavailable: {message}")]
    PersistenceUnavailable { message: String },

    #[error("Inference failed: {message}")]
    Inference { message: String },
}

fn describe_unavailable(reason: &ModelUnavailable) -> String {
    match reason {
        ModelUnavailable::UnknownModel => format!(
            "expected one of {}",
            ModelName::ALL
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
        ModelUnavailable::NotLoaded(_) => "artifact was not loaded at startup".to_string(),
    }
}

impl PredictionError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn model_not_found(model: impl Into<String>, reason: ModelUnavailable) -> Self {
        Self::ModelNotFound {
            model: model.into(),
            reason,
        }
    }
}

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Column '{0}' not found in dataset")]
    MissingColumn(String),

    #[error("Column '{column}' has non-numeric value '{value}' at row {row}")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Invalid hyperparameter {name}: {message}")]
    InvalidHyperparameter { name: &'static str, message: String },

    #[error("Fitting {model} failed: {message}")]
    Fit { model: ModelName, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<csv::Error> for TrainingError {
    fn from(e: csv::Error) -> Self {
        TrainingError::Dataset(e.to_string())
    }
}
