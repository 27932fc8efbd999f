pub mod request {
    pub use crate::modules::auth::middleware::Auth;
    use bigdecimal::BigDecimal;
    use serde::Deserialize;

    #[derive(Deserialize)]
    pub struct Body {
        pub amount: BigDecimal,
    }

    pub struct Payload {
        pub auth: Auth,
        pub body: Body,
    }
}

pub mod response {
    use crate::modules::payment::repository::Deposit;
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use bigdecimal::BigDecimal;
    use serde_json::json;

    pub enum Success {
        CheckoutCreated(Deposit),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::CheckoutCreated(deposit) => (
                    StatusCode::CREATED,
                    Json(json!({
                        "reference": deposit.reference,
                        "checkout_url": deposit.checkout_url,
                        "amount": deposit.amount,
                        "status": deposit.status,
                    })),
                )
                    .into_response(),
            }
        }
    }

    pub enum Error {
        AmountOutOfRange { min: BigDecimal, max: BigDecimal },
        GatewayUnavailable,
        FailedToCreateDeposit,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::AmountOutOfRange { min, max } => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": format!("Amount must be between {} and {}", min, max)
                    })),
                )
                    .into_response(),
                Self::GatewayUnavailable => (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "error": "Payment gateway unavailable" })),
                )
                    .into_response(),
                Self::FailedToCreateDeposit => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to create deposit" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
