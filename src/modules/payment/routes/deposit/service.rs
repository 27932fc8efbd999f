use super::types::{request, response};
use crate::{
    modules::payment::service::{self as payment, Error},
    types::Context,
};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    let (min, max) = (
        ctx.payment.min_deposit.clone(),
        ctx.payment.max_deposit.clone(),
    );

    payment::deposit(ctx, payload.auth.user, payload.body.amount)
        .await
        .map(response::Success::CheckoutCreated)
        .map_err(|err| match err {
            Error::AmountOutOfRange => response::Error::AmountOutOfRange { min, max },
            Error::GatewayUnavailable => response::Error::GatewayUnavailable,
            Error::DepositNotFound | Error::UnexpectedError => {
                response::Error::FailedToCreateDeposit
            }
        })
}
