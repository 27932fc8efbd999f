use super::types::{request, response};
use crate::{modules::number::service as number, types::Context};
use std::sync::Arc;
use validator::Validate;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    payload
        .body
        .validate()
        .map_err(response::Error::FailedToValidate)?;

    number::purchase(
        ctx,
        number::PurchasePayload {
            user_id: payload.auth.user.id.clone(),
            country_id: payload.body.country,
            service_code: payload.body.service,
        },
    )
    .await
    .map(response::Success::Purchased)
    .map_err(response::Error::Failed)
}
