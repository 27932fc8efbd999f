pub mod request {
    pub use crate::modules::auth::middleware::AdminAuth;
}

pub mod response {
    use crate::modules::catalog::service::SyncSummary;
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    pub enum Success {
        Synced(SyncSummary),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Synced(summary) => (StatusCode::OK, Json(json!(summary))).into_response(),
            }
        }
    }

    pub enum Error {
        ProviderUnavailable,
        FailedToSyncCatalog,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::ProviderUnavailable => (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "error": "SMS provider unavailable" })),
                )
                    .into_response(),
                Self::FailedToSyncCatalog => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to sync catalog" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
