pub mod request {
    use axum::http::header::{HeaderName, HeaderValue};
    use bytes::Bytes;
    use headers::{Error, Header};
    use std::iter;

    pub static MONNIFY_SIGNATURE: HeaderName = HeaderName::from_static("monnify-signature");

    #[derive(Clone, Debug)]
    pub struct MonnifySignature(pub String);

    impl Header for MonnifySignature {
        fn name() -> &'static HeaderName {
            &MONNIFY_SIGNATURE
        }

        fn decode<'i, I>(values: &mut I) -> Result<Self, Error>
        where
            Self: Sized,
            I: Iterator<Item = &'i HeaderValue>,
        {
            values
                .next()
                .and_then(|value| value.to_str().ok())
                .map(|value| Self(value.trim().to_string()))
                .ok_or_else(Error::invalid)
        }

        fn encode<E>(&self, values: &mut E)
        where
            E: Extend<HeaderValue>,
        {
            if let Ok(value) = HeaderValue::from_str(&self.0) {
                values.extend(iter::once(value))
            }
        }
    }

    pub struct Payload {
        pub signature: MonnifySignature,
        pub body: Bytes,
    }
}

pub mod response {
    use axum::{http::StatusCode, response::IntoResponse};

    pub enum Success {
        Acknowledged,
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Acknowledged => StatusCode::OK.into_response(),
            }
        }
    }

    pub enum Error {
        InvalidSignature,
        InvalidPayload,
        ServerError,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::InvalidSignature => StatusCode::BAD_REQUEST.into_response(),
                Self::InvalidPayload => StatusCode::BAD_REQUEST.into_response(),
                Self::ServerError => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}

use serde::Deserialize;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub event_type: String,
    pub event_data: serde_json::Value,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RejectedPayment {
    pub payment_reference: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SuccessfulRefund {
    pub transaction_reference: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SettledTransaction {
    pub transaction_reference: String,
}

#[derive(Deserialize, Debug)]
pub struct Settlement {
    #[serde(default)]
    pub transactions: Vec<SettledTransaction>,
}
