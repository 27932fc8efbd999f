use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// A service as sold in one country.
#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct ServiceListing {
    pub code: String,
    pub name: String,
    pub country_id: i64,
    pub price: BigDecimal,
    pub stock: i64,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub struct UpsertCountriesPayload {
    pub ids: Vec<i64>,
    pub names: Vec<String>,
}

pub async fn upsert_countries<'e, E: PgExecutor<'e>>(
    e: E,
    payload: UpsertCountriesPayload,
) -> Result<u64, Error> {
    sqlx::query(
        "
        INSERT INTO countries (id, name)
        SELECT * FROM UNNEST($1::BIGINT[], $2::TEXT[])
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            updated_at = NOW()
        ",
    )
    .bind(payload.ids)
    .bind(payload.names)
    .execute(e)
    .await
    .map(|result| result.rows_affected())
    .map_err(|err| {
        tracing::error!("Error occurred while trying to upsert countries: {}", err);
        Error::UnexpectedError
    })
}

pub struct UpsertServicesPayload {
    pub codes: Vec<String>,
    pub names: Vec<String>,
}

pub async fn upsert_services<'e, E: PgExecutor<'e>>(
    e: E,
    payload: UpsertServicesPayload,
) -> Result<u64, Error> {
    sqlx::query(
        "
        INSERT INTO services (code, name)
        SELECT * FROM UNNEST($1::TEXT[], $2::TEXT[])
        ON CONFLICT (code) DO UPDATE SET
            name = EXCLUDED.name,
            updated_at = NOW()
        ",
    )
    .bind(payload.codes)
    .bind(payload.names)
    .execute(e)
    .await
    .map(|result| result.rows_affected())
    .map_err(|err| {
        tracing::error!("Error occurred while trying to upsert services: {}", err);
        Error::UnexpectedError
    })
}

#[derive(Default)]
pub struct UpsertPricesPayload {
    pub country_ids: Vec<i64>,
    pub service_codes: Vec<String>,
    pub costs: Vec<BigDecimal>,
    pub prices: Vec<BigDecimal>,
    pub stocks: Vec<i64>,
}

pub async fn upsert_prices<'e, E: PgExecutor<'e>>(
    e: E,
    payload: UpsertPricesPayload,
) -> Result<u64, Error> {
    sqlx::query(
        "
        INSERT INTO service_prices (country_id, service_code, cost, price, stock)
        SELECT * FROM UNNEST($1::BIGINT[], $2::TEXT[], $3::NUMERIC[], $4::NUMERIC[], $5::BIGINT[])
        ON CONFLICT (country_id, service_code) DO UPDATE SET
            cost = EXCLUDED.cost,
            price = EXCLUDED.price,
            stock = EXCLUDED.stock,
            updated_at = NOW()
        ",
    )
    .bind(payload.country_ids)
    .bind(payload.service_codes)
    .bind(payload.costs)
    .bind(payload.prices)
    .bind(payload.stocks)
    .execute(e)
    .await
    .map(|result| result.rows_affected())
    .map_err(|err| {
        tracing::error!("Error occurred while trying to upsert service prices: {}", err);
        Error::UnexpectedError
    })
}

/// Zeroes the stock of every price the latest sync did not touch.
pub async fn clear_stale_stock<'e, E: PgExecutor<'e>>(
    e: E,
    synced_at: NaiveDateTime,
) -> Result<u64, Error> {
    sqlx::query(
        "
        UPDATE service_prices SET
            stock = 0
        WHERE
            COALESCE(updated_at, created_at) < $1
            AND stock <> 0
        ",
    )
    .bind(synced_at)
    .execute(e)
    .await
    .map(|result| result.rows_affected())
    .map_err(|err| {
        tracing::error!("Error occurred while trying to clear stale stock: {}", err);
        Error::UnexpectedError
    })
}

pub async fn find_many_countries<'e, E: PgExecutor<'e>>(e: E) -> Result<Vec<Country>, Error> {
    sqlx::query_as::<_, Country>("SELECT * FROM countries ORDER BY name ASC")
        .fetch_all(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while trying to fetch countries: {}", err);
            Error::UnexpectedError
        })
}

pub async fn find_country_by_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: i64,
) -> Result<Option<Country>, Error> {
    sqlx::query_as::<_, Country>("SELECT * FROM countries WHERE id = $1")
        .bind(id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while trying to fetch country by id {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
}

pub async fn find_listings_by_country_id<'e, E: PgExecutor<'e>>(
    e: E,
    country_id: i64,
) -> Result<Vec<ServiceListing>, Error> {
    sqlx::query_as::<_, ServiceListing>(
        "
        SELECT
            services.code,
            services.name,
            service_prices.country_id,
            service_prices.price,
            service_prices.stock
        FROM service_prices
        INNER JOIN services ON services.code = service_prices.service_code
        WHERE service_prices.country_id = $1
        ORDER BY services.name ASC
        ",
    )
    .bind(country_id)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to fetch services for country {}: {}",
            country_id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn find_listing<'e, E: PgExecutor<'e>>(
    e: E,
    country_id: i64,
    service_code: String,
) -> Result<Option<ServiceListing>, Error> {
    sqlx::query_as::<_, ServiceListing>(
        "
        SELECT
            services.code,
            services.name,
            service_prices.country_id,
            service_prices.price,
            service_prices.stock
        FROM service_prices
        INNER JOIN services ON services.code = service_prices.service_code
        WHERE
            service_prices.country_id = $1
            AND service_prices.service_code = $2
        ",
    )
    .bind(country_id)
    .bind(service_code.clone())
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to fetch price of {} in {}: {}",
            service_code,
            country_id,
            err
        );
        Error::UnexpectedError
    })
}
