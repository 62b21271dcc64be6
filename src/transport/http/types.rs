use crate::app::prediction_service::{PredictionOutcome, PredictionService};
use crate::domain::model::ModelName;
use crate::domain::prediction::PredictionRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
}

impl AppState {
    pub fn new(service: PredictionService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct PredictRequest {
    /// Sepal length, sepal width, petal length, petal width (cm).
    #[schema(example = json!([5.1, 3.5, 1.4, 0.2]))]
    pub features: Vec<f64>,
    #[schema(example = "random_forest")]
    pub model: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct PredictResponse {
    pub prediction: u8,
    pub model_used: ModelName,
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<f64>>,
}

impl From<PredictionOutcome> for PredictResponse {
    fn from(outcome: PredictionOutcome) -> Self {
        Self {
            prediction: outcome.label.index(),
            model_used: outcome.model,
            class_name: outcome.label.name().to_string(),
            probabilities: outcome.probabilities,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct PredictionsResponse {
    pub predictions: Vec<PredictionRecord>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct DeletedResponse {
    pub deleted_count: u64,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct WelcomeResponse {
    pub message: String,
    pub docs: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub models_loaded: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ModelInfo {
    pub name: ModelName,
    pub loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_features: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ClassInfo {
    pub id: u8,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub classes: Vec<ClassInfo>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
    pub kind: String,
}
