use crate::modules::number::service;
use axum::{extract::Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

/// JSON body for a failed activation operation.
pub fn into_response(err: service::Error) -> axum::response::Response {
    let (status, message) = match err {
        service::Error::ServiceNotFound => (StatusCode::NOT_FOUND, "Service not found".to_string()),
        service::Error::OutOfStock => (
            StatusCode::CONFLICT,
            "No numbers available for this service".to_string(),
        ),
        service::Error::InsufficientBalance => {
            (StatusCode::BAD_REQUEST, "Insufficient balance".to_string())
        }
        service::Error::ActivationNotFound => {
            (StatusCode::NOT_FOUND, "Activation not found".to_string())
        }
        service::Error::InvalidState(status) => (
            StatusCode::CONFLICT,
            format!("Activation is {}", status.to_string()),
        ),
        service::Error::EarlyCancelDenied => (
            StatusCode::CONFLICT,
            "Activation cannot be cancelled yet".to_string(),
        ),
        service::Error::ProviderUnavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Number provider unavailable".to_string(),
        ),
        service::Error::UnexpectedError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Sorry an error occurred".to_string(),
        ),
    };

    (status, Json(json!({ "error": message }))).into_response()
}
