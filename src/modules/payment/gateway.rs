//! Monnify collections API.

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, Duration, Utc};
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tokens are refreshed this long before the gateway says they expire.
const TOKEN_EXPIRY_MARGIN_SECONDS: i64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    RequestNotSent,
    InvalidHttpResponseStatusCode,
    FailedToDecodeResponse,
    NotFound,
    Rejected(String),
}

#[derive(Clone, Debug)]
pub struct MonnifyConfig {
    pub api_endpoint: String,
    pub api_key: String,
    pub secret_key: String,
    pub contract_code: String,
    pub redirect_url: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    request_successful: bool,
    response_message: Option<String>,
    response_body: Option<T>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Clone, Debug)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_EXPIRY_MARGIN_SECONDS) < self.expires_at
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayStatus {
    Paid,
    Overpaid,
    PartiallyPaid,
    Pending,
    Failed,
    Cancelled,
    Expired,
    Reversed,
    #[serde(other)]
    Unknown,
}

/// A collection as the gateway reports it.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GatewayTransaction {
    pub transaction_reference: Option<String>,
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub amount_paid: Option<BigDecimal>,
    pub payment_status: GatewayStatus,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct InitTransactionRequest<'a> {
    amount: f64,
    customer_name: &'a str,
    customer_email: &'a str,
    payment_reference: &'a str,
    payment_description: &'a str,
    currency_code: &'a str,
    contract_code: &'a str,
    redirect_url: &'a str,
    payment_methods: [&'a str; 2],
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub transaction_reference: String,
    pub payment_reference: String,
    pub checkout_url: String,
}

pub struct InitTransactionPayload {
    pub amount: BigDecimal,
    pub customer_name: String,
    pub customer_email: String,
    pub payment_reference: String,
    pub description: String,
}

#[derive(Clone)]
pub struct MonnifyClient {
    http: reqwest::Client,
    config: Arc<MonnifyConfig>,
    access_token: Arc<Mutex<Option<AccessToken>>>,
}

impl MonnifyClient {
    pub fn new(config: MonnifyConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: Arc::new(config),
            access_token: Arc::new(Mutex::new(None)),
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.config.api_endpoint.trim_end_matches('/'), route)
    }

    async fn decode<R: DeserializeOwned>(res: reqwest::Response) -> Result<R, Error> {
        let status = res.status();
        let data = res.text().await.map_err(|err| {
            tracing::error!("Failed to read Monnify response: {}", err);
            Error::FailedToDecodeResponse
        })?;

        tracing::trace!("Response received from Monnify server: {}", data);

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound);
        }

        let envelope = serde_json::from_str::<Envelope<R>>(&data).map_err(|err| {
            if status.is_success() {
                tracing::error!("Failed to decode Monnify response: {}", err);
                Error::FailedToDecodeResponse
            } else {
                tracing::error!("Got unexpected http response status: {}", status);
                Error::InvalidHttpResponseStatusCode
            }
        })?;

        match (envelope.request_successful, envelope.response_body) {
            (true, Some(body)) if status.is_success() => Ok(body),
            (_, _) => {
                let message = envelope
                    .response_message
                    .unwrap_or_else(|| status.to_string());
                tracing::error!("Monnify rejected request ({}): {}", status, message);
                Err(Error::Rejected(message))
            }
        }
    }

    async fn login(&self) -> Result<AccessToken, Error> {
        let res = self
            .http
            .post(self.url("/api/v1/auth/login"))
            .basic_auth(&self.config.api_key, Some(&self.config.secret_key))
            .send()
            .await
            .map_err(|err| {
                tracing::error!("Failed to send Monnify login request: {}", err);
                Error::RequestNotSent
            })?;

        let login = Self::decode::<LoginResponse>(res).await?;

        Ok(AccessToken {
            value: login.access_token,
            expires_at: Utc::now() + Duration::seconds(login.expires_in),
        })
    }

    /// Returns a cached token, logging in again when it is close to expiry.
    /// The lock is held across the login so concurrent callers share it.
    async fn access_token(&self) -> Result<String, Error> {
        let mut cached = self.access_token.lock().await;

        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh(Utc::now())) {
            return Ok(token.value.clone());
        }

        let token = self.login().await?;
        let value = token.value.clone();
        *cached = Some(token);

        Ok(value)
    }

    async fn send_request<R: DeserializeOwned>(
        &self,
        method: Method,
        route: &str,
        body: Option<serde_json::Value>,
    ) -> Result<R, Error> {
        let token = self.access_token().await?;

        let mut req = self
            .http
            .request(method, self.url(route))
            .bearer_auth(token);

        if let Some(body) = body {
            req = req.json(&body);
        }

        let res = req.send().await.map_err(|err| {
            tracing::error!("Failed to send Monnify request to {}: {}", route, err);
            Error::RequestNotSent
        })?;

        if res.status() == StatusCode::UNAUTHORIZED {
            *self.access_token.lock().await = None;
        }

        Self::decode(res).await
    }

    pub async fn init_transaction(&self, payload: InitTransactionPayload) -> Result<Checkout, Error> {
        let amount = payload.amount.to_f64().ok_or_else(|| {
            tracing::error!("Deposit amount {} cannot be sent to Monnify", payload.amount);
            Error::Rejected("Invalid amount".to_string())
        })?;

        let body = serde_json::to_value(InitTransactionRequest {
            amount,
            customer_name: &payload.customer_name,
            customer_email: &payload.customer_email,
            payment_reference: &payload.payment_reference,
            payment_description: &payload.description,
            currency_code: "NGN",
            contract_code: &self.config.contract_code,
            redirect_url: &self.config.redirect_url,
            payment_methods: ["CARD", "ACCOUNT_TRANSFER"],
        })
        .map_err(|err| {
            tracing::error!("Failed to encode Monnify checkout request: {}", err);
            Error::FailedToDecodeResponse
        })?;

        self.send_request(
            Method::POST,
            "/api/v1/merchant/transactions/init-transaction",
            Some(body),
        )
        .await
    }

    pub async fn find_by_payment_reference(
        &self,
        payment_reference: &str,
    ) -> Result<GatewayTransaction, Error> {
        let route = format!(
            "/api/v2/merchant/transactions/query?paymentReference={}",
            urlencoding::encode(payment_reference)
        );
        self.send_request(Method::GET, &route, None).await
    }

    pub async fn find_by_transaction_reference(
        &self,
        transaction_reference: &str,
    ) -> Result<GatewayTransaction, Error> {
        let route = format!(
            "/api/v2/transactions/{}",
            urlencoding::encode(transaction_reference)
        );
        self.send_request(Method::GET, &route, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_stale_inside_the_margin() {
        let now = Utc::now();
        let token = AccessToken {
            value: "t".to_string(),
            expires_at: now + Duration::seconds(90),
        };
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + Duration::seconds(31)));
    }

    #[test]
    fn gateway_statuses_decode() {
        let tx = serde_json::from_str::<GatewayTransaction>(
            r#"{"transactionReference": "MNFY|1", "paymentReference": "NH-1", "amountPaid": "1500.00", "paymentStatus": "OVERPAID"}"#,
        )
        .unwrap();
        assert_eq!(tx.payment_status, GatewayStatus::Overpaid);
        assert_eq!(tx.amount_paid, Some("1500".parse::<BigDecimal>().unwrap()));

        let tx = serde_json::from_str::<GatewayTransaction>(
            r#"{"paymentReference": "NH-2", "paymentStatus": "SOMETHING_NEW"}"#,
        )
        .unwrap();
        assert_eq!(tx.payment_status, GatewayStatus::Unknown);
        assert_eq!(tx.amount_paid, None);
    }
}
