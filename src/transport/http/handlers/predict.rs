use crate::transport::http::error::ApiError;
use crate::transport::http::types::{
    AppState, DeletedResponse, ErrorBody, PredictRequest, PredictResponse, PredictionsResponse,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

#[utoipa::path(
    post,
    path = "/predict",
    request_body = PredictRequest,
    responses(
        (status = 200, description = "Predicted class", body = PredictResponse),
        (status = 400, description = "Wrong feature count or unknown/unloaded model", body = ErrorBody),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ErrorBody),
        (status = 500, description = "Inference failed", body = ErrorBody)
    )
)]
pub async fn predict_handler(
    State(state): State<AppState>,
    request: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(request) = request?;
    let outcome = state
        .service
        .predict(request.features, &request.model)
        .await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    get,
    path = "/predictions",
    responses(
        (status = 200, description = "All recorded predictions in insertion order", body = PredictionsResponse),
        (status = 500, description = "Prediction store unavailable", body = ErrorBody)
    )
)]
pub async fn list_predictions_handler(
    State(state): State<AppState>,
) -> Result<Json<PredictionsResponse>, ApiError> {
    let predictions = state.service.history().await?;
    Ok(Json(PredictionsResponse { predictions }))
}

#[utoipa::path(
    delete,
    path = "/predictions",
    responses(
        (status = 200, description = "History cleared", body = DeletedResponse),
        (status = 500, description = "Prediction store unavailable", body = ErrorBody)
    )
)]
pub async fn clear_predictions_handler(
    State(state): State<AppState>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let deleted_count = state.service.clear_history().await?;
    Ok(Json(DeletedResponse { deleted_count }))
}
