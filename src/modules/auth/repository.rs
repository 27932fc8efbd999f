use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use ulid::Ulid;

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: NaiveDateTime,
    pub refresh_token_expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

type Result<T> = std::result::Result<T, Error>;

pub struct SessionCreationPayload {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: NaiveDateTime,
    pub refresh_token_expires_at: NaiveDateTime,
}

pub async fn create<'e, E: PgExecutor<'e>>(e: E, payload: SessionCreationPayload) -> Result<Session> {
    sqlx::query_as::<_, Session>(
        "
        INSERT INTO sessions (
            id,
            user_id,
            access_token,
            refresh_token,
            access_token_expires_at,
            refresh_token_expires_at
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.user_id)
    .bind(payload.access_token)
    .bind(payload.refresh_token)
    .bind(payload.access_token_expires_at)
    .bind(payload.refresh_token_expires_at)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to create a session: {}", err);
        Error::UnexpectedError
    })
}

pub async fn find_by_access_token<'e, E: PgExecutor<'e>>(
    e: E,
    access_token: String,
) -> Result<Option<Session>> {
    sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE access_token = $1")
        .bind(access_token)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching session by access token: {}", err);
            Error::UnexpectedError
        })
}

pub async fn find_by_refresh_token<'e, E: PgExecutor<'e>>(
    e: E,
    refresh_token: String,
) -> Result<Option<Session>> {
    sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE refresh_token = $1")
        .bind(refresh_token)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching session by refresh token: {}", err);
            Error::UnexpectedError
        })
}

pub struct UpdateSessionPayload {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: NaiveDateTime,
    pub refresh_token_expires_at: NaiveDateTime,
}

/// Rotates the token pair. The old refresh token must still match, so two
/// racing refreshes cannot both succeed.
pub async fn rotate_tokens<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    previous_refresh_token: String,
    payload: UpdateSessionPayload,
) -> Result<Option<Session>> {
    sqlx::query_as::<_, Session>(
        "
        UPDATE sessions SET
            access_token = $1,
            refresh_token = $2,
            access_token_expires_at = $3,
            refresh_token_expires_at = $4,
            updated_at = NOW()
        WHERE
            id = $5
            AND refresh_token = $6
        RETURNING *
        ",
    )
    .bind(payload.access_token)
    .bind(payload.refresh_token)
    .bind(payload.access_token_expires_at)
    .bind(payload.refresh_token_expires_at)
    .bind(id.clone())
    .bind(previous_refresh_token)
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while rotating tokens for session {}: {}", id, err);
        Error::UnexpectedError
    })
}

pub async fn delete_by_id<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(id.clone())
        .execute(e)
        .await
        .map(|_| ())
        .map_err(|err| {
            tracing::error!("Error occurred while deleting session {}: {}", id, err);
            Error::UnexpectedError
        })
}

pub async fn delete_expired<'e, E: PgExecutor<'e>>(e: E, now: NaiveDateTime) -> Result<u64> {
    sqlx::query("DELETE FROM sessions WHERE refresh_token_expires_at < $1")
        .bind(now)
        .execute(e)
        .await
        .map(|result| result.rows_affected())
        .map_err(|err| {
            tracing::error!("Error occurred while deleting expired sessions: {}", err);
            Error::UnexpectedError
        })
}
