pub mod request {
    pub use crate::{modules::auth::middleware::Auth, utils::pagination::Pagination};
    use crate::modules::payment::repository::DepositStatus;
    use serde::Deserialize;

    #[derive(Deserialize)]
    pub struct Filters {
        pub status: Option<DepositStatus>,
    }

    pub struct Payload {
        pub auth: Auth,
        pub filters: Filters,
        pub pagination: Pagination,
    }
}

pub mod response {
    use crate::{modules::payment::repository::Deposit, utils::pagination::Paginated};
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    pub enum Success {
        Deposits(Paginated<Deposit>),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Deposits(deposits) => (StatusCode::OK, Json(json!(deposits))).into_response(),
            }
        }
    }

    pub enum Error {
        FailedToFetchDeposits,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::FailedToFetchDeposits => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to fetch deposits" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
