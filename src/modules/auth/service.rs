use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use sqlx::PgExecutor;
use ulid::Ulid;

use super::repository::{self, Session};
use crate::types::AuthContext;

#[derive(Debug, PartialEq)]
pub enum Error {
    UnexpectedError,
    InvalidSession,
    ExpiredToken,
    InvalidCredentials,
}

type Result<T> = std::result::Result<T, Error>;

pub async fn create_session<'e, E: PgExecutor<'e>>(
    e: E,
    auth: &AuthContext,
    user_id: String,
) -> Result<Session> {
    let now = Utc::now().naive_utc();

    repository::create(
        e,
        repository::SessionCreationPayload {
            user_id,
            access_token: Ulid::new().to_string(),
            refresh_token: Ulid::new().to_string(),
            access_token_expires_at: now + auth.access_token_ttl,
            refresh_token_expires_at: now + auth.refresh_token_ttl,
        },
    )
    .await
    .map_err(|_| Error::UnexpectedError)
}

pub async fn regenerate_tokens_for_session<'e, E: PgExecutor<'e> + Copy>(
    e: E,
    auth: &AuthContext,
    refresh_token: String,
) -> Result<Session> {
    let session = verify_refresh_token(e, refresh_token.clone()).await?;
    let now = Utc::now().naive_utc();

    repository::rotate_tokens(
        e,
        session.id,
        refresh_token,
        repository::UpdateSessionPayload {
            access_token: Ulid::new().to_string(),
            refresh_token: Ulid::new().to_string(),
            access_token_expires_at: now + auth.access_token_ttl,
            refresh_token_expires_at: now + auth.refresh_token_ttl,
        },
    )
    .await
    .map_err(|_| Error::UnexpectedError)?
    .ok_or(Error::InvalidSession)
}

pub async fn verify_access_token<'e, E: PgExecutor<'e>>(
    e: E,
    access_token: String,
) -> Result<Session> {
    let session = repository::find_by_access_token(e, access_token)
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::InvalidSession)?;

    if session.access_token_expires_at < Utc::now().naive_utc() {
        return Err(Error::ExpiredToken);
    };

    Ok(session)
}

pub async fn verify_refresh_token<'e, E: PgExecutor<'e>>(
    e: E,
    refresh_token: String,
) -> Result<Session> {
    let session = repository::find_by_refresh_token(e, refresh_token)
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::InvalidSession)?;

    if session.refresh_token_expires_at < Utc::now().naive_utc() {
        return Err(Error::ExpiredToken);
    };

    Ok(session)
}

/// Hashes a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| {
            tracing::error!("Failed to hash password: {}", err);
            Error::UnexpectedError
        })
}

pub fn verify_password(password: &str, hash: &str) -> Result<()> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| Error::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| Error::InvalidCredentials)
}
