use super::{repository::Session, service};
use crate::modules::user;
use crate::modules::user::repository::User;
use crate::types::Context;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::RequestPartsExt;
use axum::{async_trait, Json};
use axum::{extract::Extension, http, http::request::Parts, response::Response};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, PartialEq)]
enum Error {
    InvalidSession,
}

fn get_session_id_from_header(header: &str) -> Result<String, Error> {
    let mut parts = header.split_whitespace();

    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => {
            Ok(token.to_string())
        }
        _ => Err(Error::InvalidSession),
    }
}

async fn get_session_from_header(
    ctx: Arc<Context>,
    header: &str,
) -> Result<(User, Session), Error> {
    let access_token = get_session_id_from_header(header)?;
    let session = service::verify_access_token(&ctx.db_conn.pool, access_token)
        .await
        .map_err(|_| Error::InvalidSession)?;

    let user = user::repository::find_by_id(&ctx.db_conn.pool, session.user_id.clone())
        .await
        .map_err(|_| Error::InvalidSession)?
        .ok_or(Error::InvalidSession)?;

    Ok((user, session))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Invalid session token"})),
    )
        .into_response()
}

async fn get_context(parts: &mut Parts) -> Result<Arc<Context>, Response> {
    parts
        .extract::<Extension<Arc<Context>>>()
        .await
        .map(|Extension(ctx)| ctx)
        .map_err(|err| {
            tracing::error!("Application context missing from request: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

async fn get_session_from_request(
    ctx: Arc<Context>,
    parts: &mut Parts,
) -> Result<(User, Session), Response> {
    let headers = parts
        .extract::<HeaderMap>()
        .await
        .map_err(|_| unauthorized())?;

    let auth_header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(unauthorized)?;

    get_session_from_header(ctx, auth_header)
        .await
        .map_err(|_| unauthorized())
}

#[derive(Serialize, Clone)]
pub struct Auth {
    pub user: User,
    #[serde(skip)]
    pub session_id: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = get_context(parts).await?;
        get_session_from_request(ctx, parts)
            .await
            .map(|(user, session)| Self {
                user,
                session_id: session.id,
            })
    }
}

#[derive(Serialize, Clone)]
pub struct AdminAuth {
    pub user: User,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminAuth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = get_context(parts).await?;
        let (user, _) = get_session_from_request(ctx, parts).await?;

        if !user::repository::is_admin(&user) {
            return Err(
                (StatusCode::FORBIDDEN, Json(json!({ "error": "Forbidden" }))).into_response(),
            );
        }

        Ok(Self { user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(
            get_session_id_from_header("Bearer 01HZX3"),
            Ok("01HZX3".to_string())
        );
        assert_eq!(
            get_session_id_from_header("bearer 01HZX3"),
            Ok("01HZX3".to_string())
        );
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert_eq!(get_session_id_from_header("Bearer"), Err(Error::InvalidSession));
        assert_eq!(
            get_session_id_from_header("Basic dXNlcjpwYXNz"),
            Err(Error::InvalidSession)
        );
        assert_eq!(
            get_session_id_from_header("Bearer a b"),
            Err(Error::InvalidSession)
        );
    }
}
