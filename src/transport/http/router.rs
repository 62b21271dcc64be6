use crate::domain::metrics::{ClassReport, EvaluationReport};
use crate::domain::model::ModelName;
use crate::domain::prediction::PredictionRecord;
use crate::transport::http::handlers::{health, models, predict};
use crate::transport::http::types::{
    AppState, ClassInfo, DeletedResponse, ErrorBody, HealthResponse, ModelInfo, ModelsResponse,
    PredictRequest, PredictResponse, PredictionsResponse, WelcomeResponse,
};
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::root_handler,
        health::healthcheck_handler,
        predict::predict_handler,
        predict::list_predictions_handler,
        predict::clear_predictions_handler,
        models::list_models_handler,
        models::model_metrics_handler
    ),
    components(schemas(
        PredictRequest,
        PredictResponse,
        PredictionsResponse,
        PredictionRecord,
        DeletedResponse,
        WelcomeResponse,
        HealthResponse,
        ModelsResponse,
        ModelInfo,
        ClassInfo,
        ModelName,
        EvaluationReport,
        ClassReport,
        ErrorBody
    ))
)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::healthcheck_handler))
        .route("/predict", post(predict::predict_handler))
        .route(
            "/predictions",
            get(predict::list_predictions_handler).delete(predict::clear_predictions_handler),
        )
        .route("/models", get(models::list_models_handler))
        .route("/models/:name/metrics", get(models::model_metrics_handler))
        .with_state(app_state)
}
