//! Service error type and HTTP mapping
//!
//! Client-input problems become 400 with a bare `{ error }` body; every
//! internal failure becomes 500 with `{ error, details }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::assemble::AssembleError;
use crate::assets::AssetError;
use crate::render::RenderError;

/// Unified service error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Request payload is missing required fields or malformed
    #[error("{0}")]
    BadRequest(String),

    /// Asset loading failed
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Document assembly failed
    #[error("Assembly error: {0}")]
    Assemble(#[from] AssembleError),

    /// Browser rendering failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Background task failed to complete
    #[error("Task error: {0}")]
    Task(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::BadRequest(message) => ErrorBody {
                error: message.clone(),
                details: None,
            },
            other => {
                tracing::error!(error = %other, "request failed");
                ErrorBody {
                    error: "PDF generation failed".to_string(),
                    details: Some(other.to_string()),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_request_maps_to_400() {
        let err = AppError::BadRequest("Missing required fields: story".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_errors_map_to_500() {
        let err = AppError::Task("worker panicked".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
