//! Adapter for SMS-Activate compatible number providers.
//!
//! Every call goes to a single `handler_api.php` endpoint selected by the
//! `action` query parameter. Catalog actions answer with JSON, activation
//! actions answer with short `KEYWORD[:field...]` text lines.

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    RequestNotSent,
    InvalidHttpResponseStatusCode,
    FailedToDecodeResponse,
    NoNumbers,
    NoBalance,
    BadKey,
    NoActivation,
    EarlyCancelDenied,
    Rejected(String),
}

/// Maps the provider's error keywords. `None` means the reply is not an error.
fn parse_error(reply: &str) -> Option<Error> {
    match reply.trim() {
        "NO_NUMBERS" => Some(Error::NoNumbers),
        "NO_BALANCE" => Some(Error::NoBalance),
        "BAD_KEY" => Some(Error::BadKey),
        "NO_ACTIVATION" | "WRONG_ACTIVATION_ID" => Some(Error::NoActivation),
        "EARLY_CANCEL_DENIED" => Some(Error::EarlyCancelDenied),
        "BAD_ACTION" | "BAD_SERVICE" | "BAD_STATUS" | "ERROR_SQL" | "BANNED" => {
            Some(Error::Rejected(reply.trim().to_string()))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberAssignment {
    pub activation_id: String,
    pub phone_number: String,
}

fn parse_number_reply(reply: &str) -> Result<NumberAssignment, Error> {
    if let Some(err) = parse_error(reply) {
        return Err(err);
    }

    let mut parts = reply.trim().splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("ACCESS_NUMBER"), Some(id), Some(phone)) if !id.is_empty() && !phone.is_empty() => {
            Ok(NumberAssignment {
                activation_id: id.to_string(),
                phone_number: phone.to_string(),
            })
        }
        _ => Err(Error::Rejected(reply.trim().to_string())),
    }
}

/// Provider-side view of an activation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderStatus {
    WaitingForCode,
    /// A code arrived and the provider is waiting for another one.
    WaitingForRetry(String),
    WaitingForResend,
    Cancelled,
    CodeReceived(String),
}

impl ProviderStatus {
    /// The latest code the provider has seen, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::WaitingForRetry(code) | Self::CodeReceived(code) => Some(code.as_str()),
            _ => None,
        }
    }
}

fn parse_status_reply(reply: &str) -> Result<ProviderStatus, Error> {
    if let Some(err) = parse_error(reply) {
        return Err(err);
    }

    let reply = reply.trim();
    let (keyword, rest) = match reply.split_once(':') {
        Some((keyword, rest)) => (keyword, Some(rest)),
        None => (reply, None),
    };

    match (keyword, rest) {
        ("STATUS_WAIT_CODE", None) => Ok(ProviderStatus::WaitingForCode),
        ("STATUS_WAIT_RESEND", None) => Ok(ProviderStatus::WaitingForResend),
        ("STATUS_CANCEL", None) => Ok(ProviderStatus::Cancelled),
        ("STATUS_WAIT_RETRY", Some(code)) => Ok(ProviderStatus::WaitingForRetry(code.to_string())),
        ("STATUS_OK", Some(code)) => Ok(ProviderStatus::CodeReceived(code.to_string())),
        _ => Err(Error::Rejected(reply.to_string())),
    }
}

/// Status codes accepted by `setStatus`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusUpdate {
    ReadyForSms,
    Complete,
    Cancel,
}

impl StatusUpdate {
    fn code(&self) -> &'static str {
        match self {
            Self::ReadyForSms => "1",
            Self::Complete => "6",
            Self::Cancel => "8",
        }
    }
}

fn parse_set_status_reply(reply: &str) -> Result<(), Error> {
    if let Some(err) = parse_error(reply) {
        return Err(err);
    }

    match reply.trim() {
        "ACCESS_READY" | "ACCESS_RETRY_GET" | "ACCESS_ACTIVATION" | "ACCESS_CANCEL"
        | "ACCESS_CANCEL_ALREADY" => Ok(()),
        other => Err(Error::Rejected(other.to_string())),
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawCountry {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    id: i64,
    eng: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCountry {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawServiceList {
    services: Vec<ProviderService>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProviderService {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawPrice {
    cost: BigDecimal,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPrice {
    pub country_id: i64,
    pub service_code: String,
    pub cost: BigDecimal,
    pub count: i64,
}

/// Drops the trailing zeros float costs pick up while decoding.
fn trim_cost(cost: BigDecimal) -> BigDecimal {
    let trimmed = cost.normalized();
    match trimmed.as_bigint_and_exponent().1 < 0 {
        true => trimmed.with_scale(0),
        false => trimmed,
    }
}

fn flatten_prices(raw: HashMap<String, HashMap<String, RawPrice>>) -> Vec<ProviderPrice> {
    raw.into_iter()
        .filter_map(|(country_id, services)| {
            country_id
                .parse::<i64>()
                .ok()
                .map(|country_id| (country_id, services))
        })
        .flat_map(|(country_id, services)| {
            services
                .into_iter()
                .map(move |(service_code, price)| ProviderPrice {
                    country_id,
                    service_code,
                    cost: trim_cost(price.cost),
                    count: price.count.max(0),
                })
        })
        .collect()
}

#[derive(Clone)]
pub struct SmsProvider {
    http: reqwest::Client,
    api_endpoint: String,
    api_key: String,
}

impl SmsProvider {
    pub fn new(api_endpoint: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_endpoint,
            api_key,
        }
    }

    async fn send(&self, action: &str, params: &[(&str, &str)]) -> Result<String, Error> {
        let url = format!(
            "{}/stubs/handler_api.php",
            self.api_endpoint.trim_end_matches('/')
        );

        let res = self
            .http
            .get(url)
            .query(&[("api_key", self.api_key.as_str()), ("action", action)])
            .query(params)
            .send()
            .await
            .map_err(|err| {
                tracing::error!("Failed to send {} request to SMS provider: {}", action, err);
                Error::RequestNotSent
            })?;

        let status = res.status();
        if !status.is_success() {
            tracing::error!(
                "Got unexpected http response status from SMS provider for {}: {}",
                action,
                status
            );
            return Err(Error::InvalidHttpResponseStatusCode);
        }

        let reply = res.text().await.map_err(|err| {
            tracing::error!("Failed to read SMS provider response for {}: {}", action, err);
            Error::FailedToDecodeResponse
        })?;

        tracing::trace!("SMS provider replied to {}: {}", action, reply);

        Ok(reply)
    }

    async fn send_json<R: serde::de::DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, &str)],
    ) -> Result<R, Error> {
        let reply = self.send(action, params).await?;

        if let Some(err) = parse_error(&reply) {
            tracing::error!("SMS provider rejected {}: {}", action, reply.trim());
            return Err(err);
        }

        serde_json::from_str::<R>(&reply).map_err(|err| {
            tracing::error!("Failed to decode SMS provider response for {}: {}", action, err);
            Error::FailedToDecodeResponse
        })
    }

    pub async fn get_countries(&self) -> Result<Vec<ProviderCountry>, Error> {
        let raw = self
            .send_json::<HashMap<String, RawCountry>>("getCountries", &[])
            .await?;

        let mut countries = raw
            .into_values()
            .map(|country| ProviderCountry {
                id: country.id,
                name: country.eng,
            })
            .collect::<Vec<_>>();
        countries.sort_by_key(|country| country.id);

        Ok(countries)
    }

    pub async fn get_services(&self) -> Result<Vec<ProviderService>, Error> {
        self.send_json::<RawServiceList>("getServicesList", &[])
            .await
            .map(|list| list.services)
    }

    pub async fn get_prices(&self) -> Result<Vec<ProviderPrice>, Error> {
        self.send_json::<HashMap<String, HashMap<String, RawPrice>>>("getPrices", &[])
            .await
            .map(flatten_prices)
    }

    pub async fn get_number(
        &self,
        country_id: i64,
        service_code: &str,
    ) -> Result<NumberAssignment, Error> {
        let country = country_id.to_string();
        let reply = self
            .send(
                "getNumber",
                &[("service", service_code), ("country", country.as_str())],
            )
            .await?;

        parse_number_reply(&reply).map_err(|err| {
            tracing::warn!(
                "SMS provider refused a number for {} in {}: {}",
                service_code,
                country_id,
                reply.trim()
            );
            err
        })
    }

    pub async fn get_status(&self, activation_id: &str) -> Result<ProviderStatus, Error> {
        let reply = self.send("getStatus", &[("id", activation_id)]).await?;
        parse_status_reply(&reply)
    }

    pub async fn set_status(&self, activation_id: &str, update: StatusUpdate) -> Result<(), Error> {
        let reply = self
            .send(
                "setStatus",
                &[("id", activation_id), ("status", update.code())],
            )
            .await?;

        parse_set_status_reply(&reply).map_err(|err| {
            tracing::warn!(
                "SMS provider refused {:?} for activation {}: {}",
                update,
                activation_id,
                reply.trim()
            );
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn number_reply_carries_id_and_phone() {
        assert_eq!(
            parse_number_reply("ACCESS_NUMBER:123456:2348012345678").unwrap(),
            NumberAssignment {
                activation_id: "123456".to_string(),
                phone_number: "2348012345678".to_string(),
            }
        );
        assert_eq!(parse_number_reply("NO_NUMBERS"), Err(Error::NoNumbers));
        assert_eq!(parse_number_reply("NO_BALANCE\n"), Err(Error::NoBalance));
        assert!(matches!(
            parse_number_reply("ACCESS_NUMBER:123"),
            Err(Error::Rejected(_))
        ));
    }

    #[test]
    fn status_replies() {
        assert_eq!(
            parse_status_reply("STATUS_WAIT_CODE").unwrap(),
            ProviderStatus::WaitingForCode
        );
        assert_eq!(
            parse_status_reply("STATUS_OK:48213").unwrap(),
            ProviderStatus::CodeReceived("48213".to_string())
        );
        assert_eq!(
            parse_status_reply("STATUS_WAIT_RETRY:11111")
                .unwrap()
                .code(),
            Some("11111")
        );
        assert_eq!(
            parse_status_reply("STATUS_CANCEL").unwrap(),
            ProviderStatus::Cancelled
        );
        assert_eq!(parse_status_reply("NO_ACTIVATION"), Err(Error::NoActivation));
        assert!(parse_status_reply("STATUS_OK").is_err());
    }

    #[test]
    fn set_status_replies() {
        assert!(parse_set_status_reply("ACCESS_CANCEL").is_ok());
        assert!(parse_set_status_reply("ACCESS_ACTIVATION").is_ok());
        assert_eq!(
            parse_set_status_reply("EARLY_CANCEL_DENIED"),
            Err(Error::EarlyCancelDenied)
        );
    }

    #[test]
    fn prices_flatten_per_country_and_service() {
        let raw = serde_json::from_str::<HashMap<String, HashMap<String, RawPrice>>>(
            r#"{"19": {"wa": {"cost": "1.25", "count": 40}, "tg": {"cost": 0.5, "count": "-1"}}, "x": {}}"#,
        )
        .unwrap();

        let mut prices = flatten_prices(raw);
        prices.sort_by(|a, b| a.service_code.cmp(&b.service_code));

        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].service_code, "tg");
        assert_eq!(prices[0].count, 0);
        assert_eq!(prices[1].cost, BigDecimal::from_str("1.25").unwrap());
        assert_eq!(prices[1].country_id, 19);
    }

    #[test]
    fn decimal_costs_keep_their_exact_value() {
        let raw = serde_json::from_str::<HashMap<String, HashMap<String, RawPrice>>>(
            r#"{"0": {"tg": {"cost": "0.1", "count": 1}, "wa": {"cost": 17.35, "count": 2}}}"#,
        )
        .unwrap();

        let mut prices = flatten_prices(raw);
        prices.sort_by(|a, b| a.service_code.cmp(&b.service_code));

        assert_eq!(prices[0].cost.to_string(), "0.1");
        assert_eq!(prices[1].cost.to_string(), "17.35");
        assert_eq!(trim_cost(BigDecimal::from_str("20.00").unwrap()).to_string(), "20");
    }
}
