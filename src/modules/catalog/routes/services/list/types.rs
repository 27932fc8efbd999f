pub mod request {
    use serde::Deserialize;

    #[derive(Deserialize)]
    pub struct Filters {
        pub country: i64,
    }
}

pub mod response {
    use crate::modules::catalog::repository::ServiceListing;
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    pub enum Success {
        Services(Vec<ServiceListing>),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Services(services) => (StatusCode::OK, Json(json!(services))).into_response(),
            }
        }
    }

    pub enum Error {
        CountryNotFound,
        FailedToFetchServices,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::CountryNotFound => (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Country not found" })),
                )
                    .into_response(),
                Self::FailedToFetchServices => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to fetch services" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
