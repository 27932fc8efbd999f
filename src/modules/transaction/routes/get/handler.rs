use super::{service::service, types::request};
use crate::types::Context;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use std::sync::Arc;

pub async fn handler(
    State(ctx): State<Arc<Context>>,
    Path(transaction_id): Path<String>,
    auth: request::Auth,
) -> impl IntoResponse {
    service(
        ctx,
        request::Payload {
            id: transaction_id,
            auth,
        },
    )
    .await
}
