use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::AppError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize, Clone)]
pub enum ApiError {
    #[error("Internal server error")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotFound(msg) => Self::NotFound(msg),
            AppError::Validation(msg) => Self::ValidationError(msg),
            other => {
                tracing::error!(error = %other, "Internal error");
                Self::InternalError("Internal server error".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InternalError(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            Self::ValidationError(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };

        let body = ErrorResponse {
            error: message,
            status: "error".to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
    status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_status_code<T: IntoResponse>(response: T, expected_status: StatusCode) {
        let response = response.into_response();
        assert_eq!(response.status(), expected_status);
    }

    #[test]
    fn app_errors_map_to_api_errors() {
        let api_error = ApiError::from(AppError::NotFound("document D1".to_string()));
        assert!(matches!(api_error, ApiError::NotFound(msg) if msg == "document D1"));

        let api_error = ApiError::from(AppError::Validation("page must be at least 1".to_string()));
        assert!(matches!(api_error, ApiError::ValidationError(_)));

        let api_error = ApiError::from(AppError::Transport("connection refused".to_string()));
        assert!(matches!(api_error, ApiError::InternalError(msg) if msg == "Internal server error"));

        let api_error = ApiError::from(AppError::Configuration("index not acknowledged".to_string()));
        assert!(matches!(api_error, ApiError::InternalError(_)));
    }

    #[test]
    fn status_codes() {
        assert_status_code(
            ApiError::InternalError("boom".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        );
        assert_status_code(ApiError::NotFound("x".to_string()), StatusCode::NOT_FOUND);
        assert_status_code(
            ApiError::ValidationError("x".to_string()),
            StatusCode::BAD_REQUEST,
        );
    }

    #[test]
    fn internal_detail_is_not_displayed() {
        let api_error = ApiError::InternalError("es password rejected".to_string());
        assert_eq!(api_error.to_string(), "Internal server error");
    }
}
