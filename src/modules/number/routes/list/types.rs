pub mod request {
    pub use crate::{modules::auth::middleware::Auth, utils::pagination::Pagination};
    use crate::modules::number::repository::ActivationStatus;
    use serde::Deserialize;

    #[derive(Deserialize)]
    pub struct Filters {
        pub status: Option<ActivationStatus>,
    }

    pub struct Payload {
        pub auth: Auth,
        pub filters: Filters,
        pub pagination: Pagination,
    }
}

pub mod response {
    use crate::{modules::number::repository::Activation, utils::pagination::Paginated};
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    pub enum Success {
        Activations(Paginated<Activation>),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Activations(activations) => {
                    (StatusCode::OK, Json(json!(activations))).into_response()
                }
            }
        }
    }

    pub enum Error {
        FailedToFetchActivations,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::FailedToFetchActivations => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to fetch activations" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
