use axum::{
    response::{IntoResponse, Response},
    Json,
    http::StatusCode,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid parameter `{field}`: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Unable to connect to the URL")]
    ConnectionFailed,

    #[error("HTTP error: {message}")]
    Upstream { status: u16, message: String },

    #[error("Content too large (max 10MB)")]
    PayloadTooLarge,

    #[error("Unable to decode content as text")]
    Undecodable,

    #[error("Request error: {0}")]
    Request(String),

    #[error("An internal error occurred: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Classifies a transport failure from the outbound client.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout
        } else if err.is_connect() {
            AppError::ConnectionFailed
        } else if let Some(status) = err.status() {
            AppError::Upstream {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_builder() {
            AppError::Internal(err.to_string())
        } else {
            AppError::Request(err.to_string())
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::ConnectionFailed => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Undecodable => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Request(_) | AppError::Internal(_) | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
