use axum::{
    extract::rejection::{BytesRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::ErrorResponse;
use crate::bridge::BridgeError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("No prompt provided")]
    MissingPrompt,

    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    #[error("Request body rejected: {1}")]
    BodyRejected(StatusCode, String),

    #[error("{0} is not set")]
    MissingCredential(&'static str),

    #[error(transparent)]
    Upstream(#[from] BridgeError),

    #[error("Not found")]
    NotFound,

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection.body_text())
    }
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        AppError::BodyRejected(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::MissingPrompt => (StatusCode::BAD_REQUEST, "No prompt provided", None),
            AppError::InvalidBody(msg) => (StatusCode::BAD_REQUEST, "Invalid JSON body", Some(msg)),
            AppError::BodyRejected(status, msg) => (status, "Invalid request body", Some(msg)),
            AppError::MissingCredential(var) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "API key not configured",
                Some(format!("{var} is not set")),
            ),
            AppError::Upstream(err) => match err.upstream_status() {
                Some(status) => (status, "Upstream API error", Some(err.to_string())),
                None => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    Some(err.to_string()),
                ),
            },
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found", None),
            AppError::Config(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error",
                Some(err.to_string()),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}
