use super::types::{request, response};
use crate::{
    modules::payment::service::{self as payment, Error},
    types::Context,
};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    payment::verify(ctx, payload.auth.user.id.clone(), payload.reference)
        .await
        .map(response::Success::Deposit)
        .map_err(|err| match err {
            Error::DepositNotFound => response::Error::DepositNotFound,
            Error::GatewayUnavailable => response::Error::GatewayUnavailable,
            Error::AmountOutOfRange | Error::UnexpectedError => {
                response::Error::FailedToVerifyDeposit
            }
        })
}
