use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use ulid::Ulid;

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Wallet {
    pub id: String,
    pub balance: BigDecimal,
    pub owner_id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub async fn create<'e, E: PgExecutor<'e>>(e: E, owner_id: String) -> Result<Wallet, Error> {
    sqlx::query_as::<_, Wallet>(
        "
        INSERT INTO wallets (id, balance, owner_id)
        VALUES ($1, 0, $2)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(owner_id)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to create a wallet: {}", err);
        Error::UnexpectedError
    })
}

pub async fn find_by_owner_id<'e, E: PgExecutor<'e>>(
    e: E,
    owner_id: String,
) -> Result<Option<Wallet>, Error> {
    sqlx::query_as::<_, Wallet>("SELECT * FROM wallets WHERE owner_id = $1")
        .bind(owner_id.clone())
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while trying to fetch the wallet of {}: {}",
                owner_id,
                err
            );
            Error::UnexpectedError
        })
}

pub async fn credit<'e, E: PgExecutor<'e>>(
    e: E,
    owner_id: String,
    amount: BigDecimal,
) -> Result<Wallet, Error> {
    sqlx::query_as::<_, Wallet>(
        "
        UPDATE wallets SET
            balance = balance + $1,
            updated_at = NOW()
        WHERE
            owner_id = $2
        RETURNING *
        ",
    )
    .bind(amount)
    .bind(owner_id.clone())
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to credit the wallet of {}: {}",
            owner_id,
            err
        );
        Error::UnexpectedError
    })
}

/// Debits only when the balance covers `amount`; `None` means nothing changed.
pub async fn debit<'e, E: PgExecutor<'e>>(
    e: E,
    owner_id: String,
    amount: BigDecimal,
) -> Result<Option<Wallet>, Error> {
    sqlx::query_as::<_, Wallet>(
        "
        UPDATE wallets SET
            balance = balance - $1,
            updated_at = NOW()
        WHERE
            owner_id = $2
            AND balance >= $1
        RETURNING *
        ",
    )
    .bind(amount)
    .bind(owner_id.clone())
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to debit the wallet of {}: {}",
            owner_id,
            err
        );
        Error::UnexpectedError
    })
}

/// Debits at most the current balance and returns the amount actually taken.
pub async fn debit_up_to<'e, E: PgExecutor<'e>>(
    e: E,
    owner_id: String,
    amount: BigDecimal,
) -> Result<BigDecimal, Error> {
    sqlx::query_scalar::<_, BigDecimal>(
        "
        WITH current_wallet AS (
            SELECT id, LEAST(balance, $1) AS taken
            FROM wallets
            WHERE owner_id = $2
            FOR UPDATE
        )
        UPDATE wallets SET
            balance = wallets.balance - current_wallet.taken,
            updated_at = NOW()
        FROM current_wallet
        WHERE wallets.id = current_wallet.id
        RETURNING current_wallet.taken
        ",
    )
    .bind(amount)
    .bind(owner_id.clone())
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to debit the wallet of {}: {}",
            owner_id,
            err
        );
        Error::UnexpectedError
    })
}
