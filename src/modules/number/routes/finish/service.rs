use super::types::{request, response};
use crate::{modules::number::service as number, types::Context};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    number::finish(ctx, payload.auth.user.id.clone(), payload.id)
        .await
        .map(response::Success::Activation)
        .map_err(response::Error)
}
