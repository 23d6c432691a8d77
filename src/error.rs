use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures surfaced by the meal store, the product lookup and request validation.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    #[error("{message}")]
    Validation { code: &'static str, message: String },

    #[error("upstream unavailable: {message}")]
    UpstreamUnavailable { code: &'static str, message: String },

    #[error("upstream timed out")]
    UpstreamTimeout,

    #[error("not found")]
    NotFound,
}

impl AppError {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn upstream(code: &'static str, err: impl std::fmt::Display) -> Self {
        Self::UpstreamUnavailable {
            code,
            message: err.to_string(),
        }
    }

    /// Machine-readable code sent as `error` in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { code, .. } => code,
            AppError::UpstreamUnavailable { code, .. } => code,
            AppError::UpstreamTimeout => "upstream_timeout",
            AppError::NotFound => "not_found",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            AppError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.code(), "message": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
