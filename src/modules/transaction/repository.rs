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
pub enum TransactionDirection {
    Outgoing,
    Incoming,
}

impl FromStr for TransactionDirection {
    type Err = InvalidVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OUTGOING" => Ok(TransactionDirection::Outgoing),
            "INCOMING" => Ok(TransactionDirection::Incoming),
            _ => Err(InvalidVariant::new(s, "TransactionDirection")),
        }
    }
}

impl TryFrom<String> for TransactionDirection {
    type Error = InvalidVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl ToString for TransactionDirection {
    fn to_string(&self) -> String {
        match self {
            TransactionDirection::Incoming => "INCOMING".to_string(),
            TransactionDirection::Outgoing => "OUTGOING".to_string(),
        }
    }
}

/// What moved the money.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionPurpose {
    Deposit,
    Purchase,
    Refund,
    Reversal,
}

impl FromStr for TransactionPurpose {
    type Err = InvalidVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(TransactionPurpose::Deposit),
            "PURCHASE" => Ok(TransactionPurpose::Purchase),
            "REFUND" => Ok(TransactionPurpose::Refund),
            "REVERSAL" => Ok(TransactionPurpose::Reversal),
            _ => Err(InvalidVariant::new(s, "TransactionPurpose")),
        }
    }
}

impl TryFrom<String> for TransactionPurpose {
    type Error = InvalidVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl ToString for TransactionPurpose {
    fn to_string(&self) -> String {
        match self {
            TransactionPurpose::Deposit => "DEPOSIT".to_string(),
            TransactionPurpose::Purchase => "PURCHASE".to_string(),
            TransactionPurpose::Refund => "REFUND".to_string(),
            TransactionPurpose::Reversal => "REVERSAL".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Transaction {
    pub id: String,
    pub amount: BigDecimal,
    #[sqlx(try_from = "String")]
    pub direction: TransactionDirection,
    #[sqlx(try_from = "String")]
    pub purpose: TransactionPurpose,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub user_id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

#[derive(Debug)]
pub struct CreatePayload {
    pub amount: BigDecimal,
    pub direction: TransactionDirection,
    pub purpose: TransactionPurpose,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub user_id: String,
}

pub async fn create<'e, E: PgExecutor<'e>>(
    e: E,
    payload: CreatePayload,
) -> Result<Transaction, Error> {
    sqlx::query_as::<_, Transaction>(
        "
        INSERT INTO transactions (id, amount, direction, purpose, reference, note, user_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.amount.clone())
    .bind(payload.direction.to_string())
    .bind(payload.purpose.to_string())
    .bind(payload.reference.clone())
    .bind(payload.note.clone())
    .bind(payload.user_id.clone())
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to create transaction {:?}: {}",
            payload,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
) -> Result<Option<Transaction>, Error> {
    sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
        .bind(id.clone())
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while trying to fetch transaction by id {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
}

pub async fn find_by_id_and_user_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    user_id: String,
) -> Result<Option<Transaction>, Error> {
    sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1 AND user_id = $2")
        .bind(id.clone())
        .bind(user_id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while trying to fetch transaction by id {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
}

#[derive(Deserialize, Default)]
pub struct FindManyFilters {
    pub user_id: Option<String>,
    pub before: Option<u64>,
    pub after: Option<u64>,
}

const FIND_MANY_FILTER: &str = "
    ($1::TEXT IS NULL OR user_id = $1)
    AND ($2::BIGINT IS NULL OR EXTRACT(EPOCH FROM created_at) < $2)
    AND ($3::BIGINT IS NULL OR EXTRACT(EPOCH FROM created_at) > $3)
";

pub async fn find_many<'e, E: PgExecutor<'e> + Copy>(
    e: E,
    pagination: Pagination,
    filters: FindManyFilters,
) -> Result<Paginated<Transaction>, Error> {
    let before = filters.before.map(|before| before as i64);
    let after = filters.after.map(|after| after as i64);

    let total = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(id) FROM transactions WHERE {}",
        FIND_MANY_FILTER
    ))
    .bind(filters.user_id.clone())
    .bind(before)
    .bind(after)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to count transactions: {}", err);
        Error::UnexpectedError
    })?;

    let items = sqlx::query_as::<_, Transaction>(&format!(
        "SELECT * FROM transactions WHERE {} ORDER BY created_at DESC LIMIT $4 OFFSET $5",
        FIND_MANY_FILTER
    ))
    .bind(filters.user_id)
    .bind(before)
    .bind(after)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to fetch transactions: {}", err);
        Error::UnexpectedError
    })?;

    Ok(pagination.into_paginated(items, total))
}
