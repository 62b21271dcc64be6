use crate::domain::error::PredictionError;
use crate::transport::http::types::ErrorBody;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Every failure an HTTP handler can return.
#[derive(Debug)]
pub enum ApiError {
    Prediction(PredictionError),
    /// Body was not valid JSON or did not match the request schema.
    Unprocessable(String),
    NotFound(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Prediction(e) => match e {
                PredictionError::InvalidInput { .. } | PredictionError::ModelNotFound { .. } => {
                    StatusCode::BAD_REQUEST
                }
                PredictionError::PersistenceUnavailable { .. }
                | PredictionError::Inference { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Prediction(e) => match e {
                PredictionError::InvalidInput { .. } => "invalid_input",
                PredictionError::ModelNotFound { .. } => "model_not_found",
                PredictionError::PersistenceUnavailable { .. } => "persistence_unavailable",
                PredictionError::Inference { .. } => "inference_failed",
            },
            ApiError::Unprocessable(_) => "unprocessable_entity",
            ApiError::NotFound(_) => "not_found",
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Prediction(e) => e.to_string(),
            ApiError::Unprocessable(msg) | ApiError::NotFound(msg) => msg.clone(),
        }
    }
}

impl From<PredictionError> for ApiError {
    fn from(e: PredictionError) -> Self {
        ApiError::Prediction(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::Unprocessable(format!("Invalid JSON body: {}", e.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), detail = %self.detail(), "request failed");
        }
        let body = ErrorBody {
            detail: self.detail(),
            kind: self.kind().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ModelUnavailable;

    #[test]
    fn maps_prediction_errors_to_status() {
        let e = ApiError::from(PredictionError::invalid_input("bad"));
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.kind(), "invalid_input");

        let e = ApiError::from(PredictionError::model_not_found(
            "lda",
            ModelUnavailable::UnknownModel,
        ));
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.kind(), "model_not_found");

        let e = ApiError::from(PredictionError::PersistenceUnavailable {
            message: "down".into(),
        });
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(
            ApiError::Unprocessable("x".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
