use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use vs_core::GenError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Generation(#[from] GenError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Error from backend: {0}")]
    BackendError(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Generation(GenError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Generation(GenError::Auth(_)) => StatusCode::UNAUTHORIZED,
            AppError::Generation(GenError::Upstream { .. }) => StatusCode::BAD_GATEWAY,
            AppError::Generation(GenError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }

        let code = match &self {
            AppError::Generation(e) => e.code().map(str::to_string),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            code,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::from(GenError::validation("x")).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(GenError::missing_credential()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::from(GenError::upstream("x")).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::from(GenError::Timeout("x".into())).status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_message_is_passed_through() {
        let err = AppError::from(GenError::validation("Prompt is required"));
        assert_eq!(err.to_string(), "Prompt is required");
    }
}
