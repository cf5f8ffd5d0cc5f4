use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use registry::RegistryError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Converts our custom `AppError` into the `{ ok: false, error }` envelope.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Registry(err) => {
                let status = StatusCode::from_u16(err.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let message = match &err {
                    RegistryError::Fetch(_) => {
                        tracing::error!(error = ?err, "Stats feed error.");
                        "Failed to fetch stats from the external source".to_string()
                    }
                    RegistryError::Persistence(_) => {
                        tracing::error!(error = ?err, "Storage error.");
                        "An internal storage error occurred".to_string()
                    }
                    RegistryError::Server(_) => {
                        tracing::error!(error = ?err, "Internal error.");
                        "An internal server error occurred".to_string()
                    }
                    _ => err.to_string(),
                };
                (status, message)
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };

        error_envelope(status, error_message)
    }
}

pub(crate) fn error_envelope(status: StatusCode, message: String) -> Response {
    let body = Json(json!({ "ok": false, "error": message }));
    (status, body).into_response()
}
