use super::{service::service, types::request};
use axum::response::IntoResponse;

pub async fn handler(request::Auth { user, .. }: request::Auth) -> impl IntoResponse {
    service(request::Payload { user }).await
}
