use crate::domain::error::{ModelUnavailable, PredictionError};
use crate::domain::metrics::EvaluationReport;
use crate::domain::model::ModelName;
use crate::domain::prediction::ClassLabel;
use crate::transport::http::error::ApiError;
use crate::transport::http::types::{AppState, ClassInfo, ErrorBody, ModelInfo, ModelsResponse};
use axum::extract::{Path, State};
use axum::Json;

#[utoipa::path(
    get,
    path = "/models",
    responses((status = 200, description = "Model catalog and class labels", body = ModelsResponse))
)]
pub async fn list_models_handler(State(state): State<AppState>) -> Json<ModelsResponse> {
    let registry = state.service.registry();
    let models = ModelName::ALL
        .into_iter()
        .map(|name| {
            let classifier = registry.get(name);
            ModelInfo {
                name,
                loaded: classifier.is_some(),
                n_features: classifier.as_ref().map(|c| c.n_features()),
                classes: classifier.as_ref().map(|c| c.n_classes()),
            }
        })
        .collect();
    let classes = ClassLabel::ALL
        .into_iter()
        .map(|label| ClassInfo {
            id: label.index(),
            name: label.name().to_string(),
        })
        .collect();

    Json(ModelsResponse { models, classes })
}

#[utoipa::path(
    get,
    path = "/models/{name}/metrics",
    params(("name" = String, Path, description = "Model name (e.g. random_forest)")),
    responses(
        (status = 200, description = "Held-out evaluation recorded at training time", body = EvaluationReport),
        (status = 400, description = "Unknown model name", body = ErrorBody),
        (status = 404, description = "No evaluation report for this model", body = ErrorBody)
    )
)]
pub async fn model_metrics_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<EvaluationReport>, ApiError> {
    let model: ModelName = name.parse().map_err(|_| {
        PredictionError::model_not_found(name.trim(), ModelUnavailable::UnknownModel)
    })?;

    state
        .service
        .registry()
        .evaluation(model)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No evaluation report for model '{}'", model)))
}
