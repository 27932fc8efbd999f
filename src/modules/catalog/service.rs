use super::repository;
use crate::{
    modules::number::provider::{self, ProviderPrice},
    types::Context,
};
use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::Serialize;
use std::{collections::HashSet, sync::Arc};

#[derive(Debug)]
pub enum Error {
    ProviderUnavailable(provider::Error),
    UnexpectedError,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SyncSummary {
    pub countries: usize,
    pub services: usize,
    pub prices: usize,
}

/// Selling price for a provider cost, rounded to kobo.
pub fn selling_price(cost: &BigDecimal, multiplier: &BigDecimal) -> BigDecimal {
    (cost * multiplier).round(2)
}

fn build_price_payload(
    prices: Vec<ProviderPrice>,
    country_ids: &HashSet<i64>,
    service_codes: &HashSet<String>,
    multiplier: &BigDecimal,
) -> repository::UpsertPricesPayload {
    prices
        .into_iter()
        .filter(|price| {
            country_ids.contains(&price.country_id) && service_codes.contains(&price.service_code)
        })
        .fold(
            repository::UpsertPricesPayload::default(),
            |mut payload, price| {
                payload.prices.push(selling_price(&price.cost, multiplier));
                payload.country_ids.push(price.country_id);
                payload.service_codes.push(price.service_code);
                payload.costs.push(price.cost);
                payload.stocks.push(price.count);
                payload
            },
        )
}

pub async fn sync(ctx: Arc<Context>) -> Result<SyncSummary, Error> {
    let provider = &ctx.number.provider;
    let started_at = Utc::now().naive_utc();

    let countries = provider
        .get_countries()
        .await
        .map_err(Error::ProviderUnavailable)?;
    let services = provider
        .get_services()
        .await
        .map_err(Error::ProviderUnavailable)?;
    let prices = provider
        .get_prices()
        .await
        .map_err(Error::ProviderUnavailable)?;

    let country_ids = countries.iter().map(|c| c.id).collect::<HashSet<_>>();
    let service_codes = services
        .iter()
        .map(|s| s.code.clone())
        .collect::<HashSet<_>>();
    let price_payload = build_price_payload(
        prices,
        &country_ids,
        &service_codes,
        &ctx.number.price_multiplier,
    );

    let summary = SyncSummary {
        countries: countries.len(),
        services: services.len(),
        prices: price_payload.country_ids.len(),
    };

    let mut tx = ctx.db_conn.pool.begin().await.map_err(|err| {
        tracing::error!("Failed to start catalog sync transaction: {}", err);
        Error::UnexpectedError
    })?;

    let (ids, names) = countries.into_iter().map(|c| (c.id, c.name)).unzip();
    repository::upsert_countries(&mut *tx, repository::UpsertCountriesPayload { ids, names })
        .await
        .map_err(|_| Error::UnexpectedError)?;

    let (codes, names) = services.into_iter().map(|s| (s.code, s.name)).unzip();
    repository::upsert_services(&mut *tx, repository::UpsertServicesPayload { codes, names })
        .await
        .map_err(|_| Error::UnexpectedError)?;

    repository::upsert_prices(&mut *tx, price_payload)
        .await
        .map_err(|_| Error::UnexpectedError)?;

    repository::clear_stale_stock(&mut *tx, started_at)
        .await
        .map_err(|_| Error::UnexpectedError)?;

    tx.commit().await.map_err(|err| {
        tracing::error!("Failed to commit catalog sync: {}", err);
        Error::UnexpectedError
    })?;

    tracing::info!(
        "Catalog synced: {} countries, {} services, {} prices",
        summary.countries,
        summary.services,
        summary.prices
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn selling_price_applies_multiplier_and_rounds() {
        assert_eq!(selling_price(&dec("12.345"), &dec("1")), dec("12.35"));
        assert_eq!(selling_price(&dec("10"), &dec("1.5")), dec("15"));
        assert_eq!(selling_price(&dec("0.333"), &dec("3")), dec("1"));
    }

    #[test]
    fn price_payload_skips_unknown_countries_and_services() {
        let prices = vec![
            ProviderPrice {
                country_id: 19,
                service_code: "wa".to_string(),
                cost: dec("2"),
                count: 12,
            },
            ProviderPrice {
                country_id: 99,
                service_code: "wa".to_string(),
                cost: dec("2"),
                count: 1,
            },
            ProviderPrice {
                country_id: 19,
                service_code: "zz".to_string(),
                cost: dec("2"),
                count: 1,
            },
        ];

        let payload = build_price_payload(
            prices,
            &HashSet::from([19]),
            &HashSet::from(["wa".to_string()]),
            &dec("1.25"),
        );

        assert_eq!(payload.country_ids, vec![19]);
        assert_eq!(payload.service_codes, vec!["wa".to_string()]);
        assert_eq!(payload.prices, vec![dec("2.5")]);
        assert_eq!(payload.stocks, vec![12]);
    }
}
