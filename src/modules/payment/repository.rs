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
pub enum DepositStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
    Expired,
    Reversed,
}

impl DepositStatus {
    pub fn is_terminal(&self) -> bool {
        *self != DepositStatus::Pending
    }
}

impl FromStr for DepositStatus {
    type Err = InvalidVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(DepositStatus::Pending),
            "PAID" => Ok(DepositStatus::Paid),
            "FAILED" => Ok(DepositStatus::Failed),
            "CANCELLED" => Ok(DepositStatus::Cancelled),
            "EXPIRED" => Ok(DepositStatus::Expired),
            "REVERSED" => Ok(DepositStatus::Reversed),
            _ => Err(InvalidVariant::new(s, "DepositStatus")),
        }
    }
}

impl TryFrom<String> for DepositStatus {
    type Error = InvalidVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl ToString for DepositStatus {
    fn to_string(&self) -> String {
        match self {
            DepositStatus::Pending => "PENDING".to_string(),
            DepositStatus::Paid => "PAID".to_string(),
            DepositStatus::Failed => "FAILED".to_string(),
            DepositStatus::Cancelled => "CANCELLED".to_string(),
            DepositStatus::Expired => "EXPIRED".to_string(),
            DepositStatus::Reversed => "REVERSED".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Deposit {
    pub id: String,
    pub reference: String,
    pub user_id: String,
    pub amount: BigDecimal,
    pub amount_paid: Option<BigDecimal>,
    #[sqlx(try_from = "String")]
    pub status: DepositStatus,
    pub checkout_url: Option<String>,
    pub gateway_reference: Option<String>,
    pub paid_at: Option<NaiveDateTime>,
    pub settled_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub fn generate_reference() -> String {
    format!("NH-{}", Ulid::new())
}

#[derive(Debug)]
pub struct CreatePayload {
    pub user_id: String,
    pub amount: BigDecimal,
}

pub async fn create<'e, E: PgExecutor<'e>>(e: E, payload: CreatePayload) -> Result<Deposit, Error> {
    sqlx::query_as::<_, Deposit>(
        "
        INSERT INTO deposits (id, reference, user_id, amount, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(generate_reference())
    .bind(payload.user_id.clone())
    .bind(payload.amount.clone())
    .bind(DepositStatus::Pending.to_string())
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to create deposit {:?}: {}",
            payload,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn attach_checkout<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    gateway_reference: String,
    checkout_url: String,
) -> Result<Deposit, Error> {
    sqlx::query_as::<_, Deposit>(
        "
        UPDATE deposits SET
            gateway_reference = $2,
            checkout_url = $3,
            updated_at = NOW()
        WHERE
            id = $1
        RETURNING *
        ",
    )
    .bind(id.clone())
    .bind(gateway_reference)
    .bind(checkout_url)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to attach checkout to deposit {}: {}",
            id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn find_by_reference<'e, E: PgExecutor<'e>>(
    e: E,
    reference: String,
) -> Result<Option<Deposit>, Error> {
    sqlx::query_as::<_, Deposit>("SELECT * FROM deposits WHERE reference = $1")
        .bind(reference.clone())
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while trying to fetch deposit {}: {}",
                reference,
                err
            );
            Error::UnexpectedError
        })
}

pub async fn find_by_reference_and_user_id<'e, E: PgExecutor<'e>>(
    e: E,
    reference: String,
    user_id: String,
) -> Result<Option<Deposit>, Error> {
    sqlx::query_as::<_, Deposit>("SELECT * FROM deposits WHERE reference = $1 AND user_id = $2")
        .bind(reference.clone())
        .bind(user_id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while trying to fetch deposit {}: {}",
                reference,
                err
            );
            Error::UnexpectedError
        })
}

pub async fn find_by_gateway_reference<'e, E: PgExecutor<'e>>(
    e: E,
    gateway_reference: String,
) -> Result<Option<Deposit>, Error> {
    sqlx::query_as::<_, Deposit>("SELECT * FROM deposits WHERE gateway_reference = $1")
        .bind(gateway_reference.clone())
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while trying to fetch deposit by gateway reference {}: {}",
                gateway_reference,
                err
            );
            Error::UnexpectedError
        })
}

pub struct FindManyFilters {
    pub user_id: String,
    pub status: Option<DepositStatus>,
}

pub async fn find_many<'e, E: PgExecutor<'e> + Copy>(
    e: E,
    pagination: Pagination,
    filters: FindManyFilters,
) -> Result<Paginated<Deposit>, Error> {
    let status = filters.status.map(|status| status.to_string());

    let total = sqlx::query_scalar::<_, i64>(
        "
        SELECT COUNT(id) FROM deposits
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
        tracing::error!("Error occurred while trying to count deposits: {}", err);
        Error::UnexpectedError
    })?;

    let items = sqlx::query_as::<_, Deposit>(
        "
        SELECT * FROM deposits
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
        tracing::error!("Error occurred while trying to fetch deposits: {}", err);
        Error::UnexpectedError
    })?;

    Ok(pagination.into_paginated(items, total))
}

pub async fn find_pending_created_before<'e, E: PgExecutor<'e>>(
    e: E,
    before: NaiveDateTime,
) -> Result<Vec<Deposit>, Error> {
    sqlx::query_as::<_, Deposit>(
        "
        SELECT * FROM deposits
        WHERE
            status = $1
            AND created_at < $2
        ORDER BY created_at ASC
        LIMIT 100
        ",
    )
    .bind(DepositStatus::Pending.to_string())
    .bind(before)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to fetch pending deposits: {}", err);
        Error::UnexpectedError
    })
}

pub struct MarkPaidPayload {
    pub amount_paid: BigDecimal,
    pub gateway_reference: Option<String>,
}

/// PENDING -> PAID. `None` when the deposit had already left PENDING.
pub async fn mark_paid<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    payload: MarkPaidPayload,
) -> Result<Option<Deposit>, Error> {
    sqlx::query_as::<_, Deposit>(
        "
        UPDATE deposits SET
            status = $2,
            amount_paid = $3,
            gateway_reference = COALESCE($4, gateway_reference),
            paid_at = NOW(),
            updated_at = NOW()
        WHERE
            id = $1
            AND status = $5
        RETURNING *
        ",
    )
    .bind(id.clone())
    .bind(DepositStatus::Paid.to_string())
    .bind(payload.amount_paid)
    .bind(payload.gateway_reference)
    .bind(DepositStatus::Pending.to_string())
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to mark deposit {} paid: {}", id, err);
        Error::UnexpectedError
    })
}

/// Moves a deposit from `from` to `to`. `None` when it was no longer in `from`.
pub async fn transition<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    from: DepositStatus,
    to: DepositStatus,
) -> Result<Option<Deposit>, Error> {
    sqlx::query_as::<_, Deposit>(
        "
        UPDATE deposits SET
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
        tracing::error!("Error occurred while trying to update deposit {}: {}", id, err);
        Error::UnexpectedError
    })
}

pub async fn mark_settled<'e, E: PgExecutor<'e>>(
    e: E,
    gateway_references: Vec<String>,
) -> Result<u64, Error> {
    sqlx::query(
        "
        UPDATE deposits SET
            settled_at = NOW(),
            updated_at = NOW()
        WHERE
            gateway_reference = ANY($1)
            AND settled_at IS NULL
        ",
    )
    .bind(gateway_references)
    .execute(e)
    .await
    .map(|result| result.rows_affected())
    .map_err(|err| {
        tracing::error!("Error occurred while trying to mark deposits settled: {}", err);
        Error::UnexpectedError
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_are_unique_and_prefixed() {
        let a = generate_reference();
        let b = generate_reference();
        assert!(a.starts_with("NH-"));
        assert_ne!(a, b);
    }

    #[test]
    fn only_pending_is_open() {
        assert!(!DepositStatus::Pending.is_terminal());
        assert!(DepositStatus::Reversed.is_terminal());
        assert_eq!(
            DepositStatus::try_from("CANCELLED".to_string()).unwrap(),
            DepositStatus::Cancelled
        );
    }
}
