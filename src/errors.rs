//! Error handling for the web handlers
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    HTTPError(axum::http::Error),
    TemplateError(askama::Error),
    CardNotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::HTTPError(e) => {
                error!("HTTP error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("HTTP error: {e}"),
                )
                    .into_response()
            }
            Self::TemplateError(e) => {
                error!("Template error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Template error: {e}"),
                )
                    .into_response()
            }
            Self::CardNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Card not found: {id}")).into_response()
            }
        }
    }
}

impl From<axum::http::Error> for ApiError {
    fn from(e: axum::http::Error) -> Self {
        Self::HTTPError(e)
    }
}

impl From<askama::Error> for ApiError {
    fn from(e: askama::Error) -> Self {
        Self::TemplateError(e)
    }
}
