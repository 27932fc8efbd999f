pub mod request {
    pub use crate::modules::auth::middleware::Auth;
    use serde::Deserialize;
    use validator::Validate;

    #[derive(Deserialize, Validate)]
    pub struct Body {
        #[validate(range(min = 0, message = "Invalid country"))]
        pub country: i64,
        #[validate(length(min = 1, max = 32, message = "Invalid service"))]
        pub service: String,
    }

    pub struct Payload {
        pub auth: Auth,
        pub body: Body,
    }
}

pub mod response {
    use super::super::super::errors;
    use crate::{
        modules::number::{repository::Activation, service},
        utils::validation,
    };
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;
    use validator::ValidationErrors;

    pub enum Success {
        Purchased(Activation),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Purchased(activation) => {
                    (StatusCode::CREATED, Json(json!(activation))).into_response()
                }
            }
        }
    }

    pub enum Error {
        FailedToValidate(ValidationErrors),
        Failed(service::Error),
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::FailedToValidate(errors) => validation::into_response(errors).into_response(),
                Self::Failed(err) => errors::into_response(err),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
