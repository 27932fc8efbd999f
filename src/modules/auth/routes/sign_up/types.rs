pub mod request {
    use regex::Regex;
    use serde::Deserialize;
    use std::borrow::Cow;
    use validator::{Validate, ValidationError};

    fn validate_password(password: &str) -> Result<(), ValidationError> {
        let letter = Regex::new(r"[A-Za-z]").expect("Invalid password letter regex");
        let digit = Regex::new(r"\d").expect("Invalid password digit regex");
        match letter.is_match(password) && digit.is_match(password) {
            true => Ok(()),
            false => Err(ValidationError::new("WEAK_PASSWORD").with_message(Cow::from(
                "Password must contain at least one letter and one digit",
            ))),
        }
    }

    #[derive(Deserialize, Validate)]
    pub struct Payload {
        #[validate(email(code = "INVALID_USER_EMAIL", message = "Invalid email address"))]
        pub email: String,
        #[validate(
            length(min = 8, code = "PASSWORD_TOO_SHORT", message = "Password is too short"),
            custom(code = "WEAK_PASSWORD", function = "validate_password")
        )]
        pub password: String,
        #[validate(length(min = 1, message = "First name is required"))]
        pub first_name: String,
        #[validate(length(min = 1, message = "Last name is required"))]
        pub last_name: String,
    }
}

pub mod response {
    use crate::utils::validation;
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;
    use validator::ValidationErrors;

    pub enum Success {
        AccountCreated,
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::AccountCreated => (
                    StatusCode::CREATED,
                    Json(json!({"message": "Sign up successful"})),
                )
                    .into_response(),
            }
        }
    }

    pub enum Error {
        FailedToValidate(ValidationErrors),
        FailedToFetchUser,
        EmailAlreadyInUse,
        SignupFailed,
        FailedToCreateWallet,
        UnexpectedError,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::FailedToValidate(errors) => validation::into_response(errors).into_response(),
                Self::FailedToFetchUser => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to fetch user" })),
                )
                    .into_response(),
                Self::EmailAlreadyInUse => (
                    StatusCode::CONFLICT,
                    Json(json!({ "error": "Email already in use" })),
                )
                    .into_response(),
                Self::SignupFailed => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Sign up failed!" })),
                )
                    .into_response(),
                Self::FailedToCreateWallet => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to create wallet" })),
                )
                    .into_response(),
                Self::UnexpectedError => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Sorry an error occurred" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
