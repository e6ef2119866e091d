use crate::config::ErrorStatusPolicy;
use crate::utils::validation::ValidationError;
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Malformed or truncated body; `too_large` when the route body limit cut it off
    #[error("{message}")]
    Multipart { message: String, too_large: bool },

    #[error("Request timed out")]
    Timeout,

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Internal Server Error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn multipart(e: &MultipartError) -> Self {
        AppError::Multipart {
            message: e.body_text(),
            too_large: e.status() == StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    pub fn status_code(&self, policy: ErrorStatusPolicy) -> StatusCode {
        match (self, policy) {
            (AppError::Unauthorized, _) => StatusCode::UNAUTHORIZED,
            (_, ErrorStatusPolicy::ServerError) => StatusCode::INTERNAL_SERVER_ERROR,
            (AppError::Validation(e), ErrorStatusPolicy::Split) => match e {
                ValidationError::NotAnImage { .. } | ValidationError::ContentMismatch { .. } => {
                    StatusCode::UNSUPPORTED_MEDIA_TYPE
                }
                ValidationError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                ValidationError::TooManyFiles { .. } | ValidationError::UnexpectedField { .. } => {
                    StatusCode::BAD_REQUEST
                }
            },
            (AppError::Multipart { too_large: true, .. }, ErrorStatusPolicy::Split) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            (AppError::Multipart { .. }, ErrorStatusPolicy::Split) => StatusCode::BAD_REQUEST,
            (AppError::Timeout, ErrorStatusPolicy::Split) => StatusCode::REQUEST_TIMEOUT,
            (AppError::Io(_) | AppError::Internal(_), ErrorStatusPolicy::Split) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Renders `{"ok": false, "error": <message>}` with the status the policy assigns
    pub fn into_response_with(self, policy: ErrorStatusPolicy) -> Response {
        let status = self.status_code(policy);
        let message = match &self {
            AppError::Io(e) => {
                tracing::error!("I/O error: {:?}", e);
                e.to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "ok": false,
            "error": message
        }));

        (status, body).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_with(ErrorStatusPolicy::default())
    }
}
