//! Errors returned by the web viewer.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{index::ImageNotFound, prelude::*, translate::TranslateError};

/// Body of the plain-text response when there is nothing to browse.
pub const NO_IMAGES_MESSAGE: &str = "No images found in static directory.";

/// An error which can be turned into an HTTP response.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The static directory holds no images at all.
    #[error("No images found in static directory.")]
    NoImages,

    /// The request itself was malformed.
    #[error("{0}")]
    BadRequest(String),

    /// A requested image or one of its OCR files doesn't exist.
    #[error("{0}")]
    NotFound(String),

    /// The translation service refused the request.
    #[error("Translation failed")]
    TranslationFailed(StatusCode),

    /// Translation isn't configured.
    #[error("{0}")]
    Unavailable(String),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// The error message.
    pub error: String,
}

impl IntoResponse for ViewerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ViewerError::NoImages => {
                return (StatusCode::NOT_FOUND, NO_IMAGES_MESSAGE).into_response();
            }
            ViewerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ViewerError::NotFound(_) => StatusCode::NOT_FOUND,
            ViewerError::TranslationFailed(status) => *status,
            ViewerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ViewerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(%status, "{self}");
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ImageNotFound> for ViewerError {
    fn from(err: ImageNotFound) -> Self {
        ViewerError::NotFound(err.to_string())
    }
}

impl From<TranslateError> for ViewerError {
    fn from(err: TranslateError) -> Self {
        match err {
            TranslateError::Status(status) => ViewerError::TranslationFailed(status),
            other => ViewerError::Internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ViewerError {
    fn from(err: anyhow::Error) -> Self {
        ViewerError::Internal(format!("{err:#}"))
    }
}
