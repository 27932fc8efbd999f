use axum::{http::StatusCode, Json};
use serde_json::json;
use validator::ValidationErrors;

/// 400 carrying a summary plus the failing fields.
pub fn into_response(errors: ValidationErrors) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "Invalid request payload",
            "errors": errors.field_errors(),
        })),
    )
}
