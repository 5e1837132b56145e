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

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Payment error: {0}")]
    PaymentError(String),

    #[error("Upstream error: {0}")]
    UpstreamError(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Database(_) | AppError::OpenAI(_) => {
                tracing::error!("Internal error: {:?}", err);
                Self::InternalError("Internal server error".to_string())
            }
            AppError::NotFound(msg) => Self::NotFound(msg),
            AppError::Validation(msg) | AppError::MissingTranscript(msg) => {
                Self::ValidationError(msg)
            }
            AppError::Auth(msg) => Self::Unauthorized(msg),
            AppError::Payment(msg) => Self::PaymentError(msg),
            AppError::Upstream(msg) => Self::UpstreamError(msg),
            _ => Self::InternalError("Internal server error".to_string()),
        }
    }
}

impl From<surrealdb::Error> for ApiError {
    fn from(err: surrealdb::Error) -> Self {
        Self::from(AppError::Database(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InternalError(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            Self::ValidationError(message) | Self::PaymentError(message) => {
                (StatusCode::BAD_REQUEST, message)
            }
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            Self::UpstreamError(message) => (StatusCode::BAD_GATEWAY, message),
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                status: "error".to_string(),
            }),
        )
            .into_response()
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
    use std::fmt::Debug;

    fn assert_status_code<T: IntoResponse + Debug>(response: T, expected_status: StatusCode) {
        let response = response.into_response();
        assert_eq!(response.status(), expected_status);
    }

    #[test]
    fn app_error_conversion_preserves_categories() {
        let not_found = AppError::NotFound("course missing".to_string());
        assert!(matches!(
            ApiError::from(not_found),
            ApiError::NotFound(msg) if msg == "course missing"
        ));

        let validation = AppError::Validation("missing youtube_ids".to_string());
        assert!(matches!(
            ApiError::from(validation),
            ApiError::ValidationError(msg) if msg == "missing youtube_ids"
        ));

        let auth = AppError::Auth("token expired".to_string());
        assert!(matches!(
            ApiError::from(auth),
            ApiError::Unauthorized(msg) if msg == "token expired"
        ));

        let payment = AppError::Payment("signature mismatch".to_string());
        assert!(matches!(
            ApiError::from(payment),
            ApiError::PaymentError(msg) if msg == "signature mismatch"
        ));

        let internal =
            AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, "io error"));
        assert!(matches!(ApiError::from(internal), ApiError::InternalError(_)));
    }

    #[test]
    fn response_status_codes() {
        assert_status_code(
            ApiError::InternalError("boom".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        );
        assert_status_code(
            ApiError::ValidationError("bad".to_string()),
            StatusCode::BAD_REQUEST,
        );
        assert_status_code(
            ApiError::PaymentError("bad signature".to_string()),
            StatusCode::BAD_REQUEST,
        );
        assert_status_code(
            ApiError::NotFound("missing".to_string()),
            StatusCode::NOT_FOUND,
        );
        assert_status_code(
            ApiError::Unauthorized("nope".to_string()),
            StatusCode::UNAUTHORIZED,
        );
        assert_status_code(
            ApiError::UpstreamError("youtube down".to_string()),
            StatusCode::BAD_GATEWAY,
        );
    }

    #[test]
    fn internal_error_message_is_sanitized() {
        let api_error = ApiError::InternalError("db password incorrect".to_string());
        assert_eq!(api_error.to_string(), "Internal server error");
    }
}
