pub mod request {
    pub use crate::modules::auth::middleware::Auth;

    pub struct Payload {
        pub reference: String,
        pub auth: Auth,
    }
}

pub mod response {
    use crate::modules::payment::repository::Deposit;
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    pub enum Success {
        Deposit(Deposit),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Deposit(deposit) => (StatusCode::OK, Json(json!(deposit))).into_response(),
            }
        }
    }

    pub enum Error {
        DepositNotFound,
        GatewayUnavailable,
        FailedToVerifyDeposit,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::DepositNotFound => (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Deposit not found" })),
                )
                    .into_response(),
                Self::GatewayUnavailable => (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "error": "Payment gateway unavailable" })),
                )
                    .into_response(),
                Self::FailedToVerifyDeposit => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to verify deposit" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
