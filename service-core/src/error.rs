use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message returned to callers for any failure whose details must stay server-side.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Authorization code is missing.")]
    MissingCode,

    #[error("Missing parameters: {0}")]
    MissingParameters(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A failure reported by an upstream party, relayed with its own status.
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::MissingCode
            | AppError::MissingParameters(_)
            | AppError::InvalidEndpoint(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream { status, .. } => *status,
            AppError::InternalError(_) | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

/// Error body shared by every service: `{ "error": "..." }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let error = match self {
            AppError::MethodNotAllowed => "Method Not Allowed".to_string(),
            AppError::MissingCode => "Authorization code is missing.".to_string(),
            AppError::MissingParameters(msg) | AppError::InvalidEndpoint(msg) => msg,
            AppError::Upstream { message, .. } => message,
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Request failed with internal error");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Request failed with configuration error");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn internal_errors_never_leak_details() {
        let (status, body) = body_of(AppError::InternalError(anyhow::anyhow!(
            "connection refused to 10.0.0.7 with secret=abc"
        )))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], INTERNAL_ERROR_MESSAGE);
        assert!(!body.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn upstream_errors_keep_their_status() {
        let (status, body) = body_of(AppError::Upstream {
            status: StatusCode::UNAUTHORIZED,
            message: "Invalid authorization code".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid authorization code");
    }

    #[tokio::test]
    async fn missing_code_is_bad_request() {
        let (status, body) = body_of(AppError::MissingCode).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Authorization code is missing.");
    }
}
