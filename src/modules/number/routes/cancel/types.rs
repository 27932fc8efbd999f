pub mod request {
    pub use crate::modules::auth::middleware::Auth;

    pub struct Payload {
        pub id: String,
        pub auth: Auth,
    }
}

pub mod response {
    use super::super::super::errors;
    use crate::modules::number::{repository::Activation, service};
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    pub enum Success {
        Activation(Activation),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Activation(activation) => {
                    (StatusCode::OK, Json(json!(activation))).into_response()
                }
            }
        }
    }

    pub struct Error(pub service::Error);

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            errors::into_response(self.0)
        }
    }

    pub type Response = Result<Success, Error>;
}
