use crate::utils::{
    database::InvalidVariant,
    pagination::{Paginated, Pagination},
};
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use std::str::FromStr;
use ulid::Ulid;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivationStatus {
    Waiting,
    Received,
    Completed,
    Cancelled,
    Expired,
}

impl FromStr for ActivationStatus {
    type Err = InvalidVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WAITING" => Ok(ActivationStatus::Waiting),
            "RECEIVED" => Ok(ActivationStatus::Received),
            "COMPLETED" => Ok(ActivationStatus::Completed),
            "CANCELLED" => Ok(ActivationStatus::Cancelled),
            "EXPIRED" => Ok(ActivationStatus::Expired),
            _ => Err(InvalidVariant::new(s, "ActivationStatus")),
        }
    }
}

impl TryFrom<String> for ActivationStatus {
    type Error = InvalidVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl ToString for ActivationStatus {
    fn to_string(&self) -> String {
        match self {
            ActivationStatus::Waiting => "WAITING".to_string(),
            ActivationStatus::Received => "RECEIVED".to_string(),
            ActivationStatus::Completed => "COMPLETED".to_string(),
            ActivationStatus::Cancelled => "CANCELLED".to_string(),
            ActivationStatus::Expired => "EXPIRED".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Activation {
    pub id: String,
    pub user_id: String,
    pub provider_activation_id: String,
    pub phone_number: String,
    pub country_id: i64,
    pub service_code: String,
    pub price: BigDecimal,
    #[sqlx(try_from = "String")]
    pub status: ActivationStatus,
    pub code: Option<String>,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

#[derive(Debug)]
pub struct CreatePayload {
    pub user_id: String,
    pub provider_activation_id: String,
    pub phone_number: String,
    pub country_id: i64,
    pub service_code: String,
    pub price: BigDecimal,
    pub expires_at: NaiveDateTime,
}

pub async fn create<'e, E: PgExecutor<'e>>(
    e: E,
    payload: CreatePayload,
) -> Result<Activation, Error> {
    sqlx::query_as::<_, Activation>(
        "
        INSERT INTO activations (
            id,
            user_id,
            provider_activation_id,
            phone_number,
            country_id,
            service_code,
            price,
            status,
            expires_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.user_id.clone())
    .bind(payload.provider_activation_id.clone())
    .bind(payload.phone_number.clone())
    .bind(payload.country_id)
    .bind(payload.service_code.clone())
    .bind(payload.price.clone())
    .bind(ActivationStatus::Waiting.to_string())
    .bind(payload.expires_at)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to create activation {:?}: {}",
            payload,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn find_by_id_and_user_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    user_id: String,
) -> Result<Option<Activation>, Error> {
    sqlx::query_as::<_, Activation>("SELECT * FROM activations WHERE id = $1 AND user_id = $2")
        .bind(id.clone())
        .bind(user_id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while trying to fetch activation by id {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
}

pub struct FindManyFilters {
    pub user_id: String,
    pub status: Option<ActivationStatus>,
}

pub async fn find_many<'e, E: PgExecutor<'e> + Copy>(
    e: E,
    pagination: Pagination,
    filters: FindManyFilters,
) -> Result<Paginated<Activation>, Error> {
    let status = filters.status.map(|status| status.to_string());

    let total = sqlx::query_scalar::<_, i64>(
        "
        SELECT COUNT(id) FROM activations
        WHERE
            user_id = $1
            AND ($2::TEXT IS NULL OR status = $2)
        ",
    )
    .bind(filters.user_id.clone())
    .bind(status.clone())
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to count activations: {}", err);
        Error::UnexpectedError
    })?;

    let items = sqlx::query_as::<_, Activation>(
        "
        SELECT * FROM activations
        WHERE
            user_id = $1
            AND ($2::TEXT IS NULL OR status = $2)
        ORDER BY created_at DESC
        LIMIT $3
        OFFSET $4
        ",
    )
    .bind(filters.user_id)
    .bind(status)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to fetch activations: {}", err);
        Error::UnexpectedError
    })?;

    Ok(pagination.into_paginated(items, total))
}

/// Stores the latest SMS code. Only open activations accept codes.
pub async fn record_code<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    code: String,
) -> Result<Option<Activation>, Error> {
    sqlx::query_as::<_, Activation>(
        "
        UPDATE activations SET
            status = $3,
            code = $2,
            updated_at = NOW()
        WHERE
            id = $1
            AND status IN ($4, $3)
        RETURNING *
        ",
    )
    .bind(id.clone())
    .bind(code)
    .bind(ActivationStatus::Received.to_string())
    .bind(ActivationStatus::Waiting.to_string())
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to record code for activation {}: {}",
            id,
            err
        );
        Error::UnexpectedError
    })
}

/// Moves an activation from `from` to `to`. `None` when it was no longer in `from`.
pub async fn transition<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    from: ActivationStatus,
    to: ActivationStatus,
) -> Result<Option<Activation>, Error> {
    sqlx::query_as::<_, Activation>(
        "
        UPDATE activations SET
            status = $3,
            updated_at = NOW()
        WHERE
            id = $1
            AND status = $2
        RETURNING *
        ",
    )
    .bind(id.clone())
    .bind(from.to_string())
    .bind(to.to_string())
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to update activation {}: {}",
            id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn find_expired_waiting<'e, E: PgExecutor<'e>>(
    e: E,
    now: NaiveDateTime,
) -> Result<Vec<Activation>, Error> {
    sqlx::query_as::<_, Activation>(
        "
        SELECT * FROM activations
        WHERE
            status = $1
            AND expires_at < $2
        ORDER BY expires_at ASC
        ",
    )
    .bind(ActivationStatus::Waiting.to_string())
    .bind(now)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to fetch expired activations: {}",
            err
        );
        Error::UnexpectedError
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_from_column_values() {
        assert_eq!(
            ActivationStatus::try_from("RECEIVED".to_string()).unwrap(),
            ActivationStatus::Received
        );
        assert_eq!(ActivationStatus::Expired.to_string(), "EXPIRED");
        assert!("DONE".parse::<ActivationStatus>().is_err());
    }
}
