pub use crate::utils::database;
use crate::modules::{number::provider::SmsProvider, payment::gateway::MonnifyClient};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub enum AppEnvironment {
    Production,
    Development,
}

impl AppEnvironment {
    pub fn from(raw_environment: String) -> Self {
        match raw_environment.as_ref() {
            "production" => Self::Production,
            _ => Self::Development,
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
}

#[derive(Clone)]
pub struct AuthContext {
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

#[derive(Clone)]
pub struct PaymentContext {
    pub gateway: MonnifyClient,
    pub webhook_secret: String,
    pub min_deposit: BigDecimal,
    pub max_deposit: BigDecimal,
    pub checkout_lifetime: Duration,
}

#[derive(Clone)]
pub struct NumberContext {
    pub provider: SmsProvider,
    pub price_multiplier: BigDecimal,
    pub activation_window: Duration,
}

#[derive(Clone)]
pub struct Context {
    pub app: AppContext,
    pub db_conn: database::DatabaseConnection,
    pub auth: AuthContext,
    pub payment: PaymentContext,
    pub number: NumberContext,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
}

#[derive(Clone)]
pub struct PaymentConfig {
    pub api_endpoint: String,
    pub api_key: String,
    pub secret_key: String,
    pub contract_code: String,
    pub redirect_url: String,
    pub min_deposit: BigDecimal,
    pub max_deposit: BigDecimal,
    pub checkout_lifetime_minutes: i64,
}

#[derive(Clone)]
pub struct NumberConfig {
    pub api_endpoint: String,
    pub api_key: String,
    pub price_multiplier: BigDecimal,
    pub activation_window_minutes: i64,
}

#[derive(Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub app: AppConfig,
    pub auth: AuthConfig,
    pub payment: PaymentConfig,
    pub number: NumberConfig,
}

/// Tick produced by the cron streams; carries the firing time.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Job(DateTime<Utc>);

impl apalis::prelude::Job for Job {
    const NAME: &'static str = "numhub::Job";
}

impl From<DateTime<Utc>> for Job {
    fn from(t: DateTime<Utc>) -> Self {
        Self(t)
    }
}

pub type JobFn = Arc<
    dyn Fn() -> Pin<Box<dyn Future<Output = Result<(), apalis::prelude::Error>> + Send>>
        + Send
        + Sync,
>;

pub struct SchedulableJob {
    pub name: &'static str,
    pub schedule: apalis::cron::Schedule,
    pub job: JobFn,
}

fn parse_env<T: FromStr>(key: &str, default: &str) -> T {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .unwrap_or_else(|_| panic!("Invalid {} value", key))
}

impl Default for Config {
    fn default() -> Self {
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let database_max_connections = parse_env::<u32>("DATABASE_MAX_CONNECTIONS", "4");
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let environment = env::var("APP_ENV").expect("APP_ENV not set");
        let port = parse_env::<u32>("PORT", "8000");
        let url = env::var("URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));
        let access_token_ttl_minutes = parse_env::<i64>("ACCESS_TOKEN_TTL_MINUTES", "15");
        let refresh_token_ttl_days = parse_env::<i64>("REFRESH_TOKEN_TTL_DAYS", "30");
        let payment_api_endpoint =
            env::var("MONNIFY_API_ENDPOINT").expect("MONNIFY_API_ENDPOINT not set");
        let payment_api_key = env::var("MONNIFY_API_KEY").expect("MONNIFY_API_KEY not set");
        let payment_secret_key =
            env::var("MONNIFY_SECRET_KEY").expect("MONNIFY_SECRET_KEY not set");
        let payment_contract_code =
            env::var("MONNIFY_CONTRACT_CODE").expect("MONNIFY_CONTRACT_CODE not set");
        let payment_redirect_url = env::var("MONNIFY_REDIRECT_URL")
            .unwrap_or_else(|_| format!("{}/dashboard/wallet", url));
        let min_deposit = parse_env::<BigDecimal>("DEPOSIT_MIN_AMOUNT", "100");
        let max_deposit = parse_env::<BigDecimal>("DEPOSIT_MAX_AMOUNT", "1000000");
        let checkout_lifetime_minutes = parse_env::<i64>("CHECKOUT_LIFETIME_MINUTES", "60");
        let number_api_endpoint =
            env::var("SMS_PROVIDER_API_ENDPOINT").expect("SMS_PROVIDER_API_ENDPOINT not set");
        let number_api_key = env::var("SMS_PROVIDER_API_KEY").expect("SMS_PROVIDER_API_KEY not set");
        let price_multiplier = parse_env::<BigDecimal>("NUMBER_PRICE_MULTIPLIER", "1");
        let activation_window_minutes = parse_env::<i64>("ACTIVATION_WINDOW_MINUTES", "20");

        Self {
            database: DatabaseConfig {
                url: database_url,
                max_connections: database_max_connections,
            },
            app: AppConfig {
                host,
                environment: AppEnvironment::from(environment),
                port,
                url,
            },
            auth: AuthConfig {
                access_token_ttl_minutes,
                refresh_token_ttl_days,
            },
            payment: PaymentConfig {
                api_endpoint: payment_api_endpoint,
                api_key: payment_api_key,
                secret_key: payment_secret_key,
                contract_code: payment_contract_code,
                redirect_url: payment_redirect_url,
                min_deposit,
                max_deposit,
                checkout_lifetime_minutes,
            },
            number: NumberConfig {
                api_endpoint: number_api_endpoint,
                api_key: number_api_key,
                price_multiplier,
                activation_window_minutes,
            },
        }
    }
}

#[async_trait]
pub trait ToContext {
    async fn to_context(self) -> Context;
}

#[async_trait]
impl ToContext for Config {
    async fn to_context(self) -> Context {
        let db_conn =
            database::connect(self.database.url.as_str(), self.database.max_connections).await;
        database::migrate(db_conn.clone()).await;

        let gateway = MonnifyClient::new(
            crate::modules::payment::gateway::MonnifyConfig {
                api_endpoint: self.payment.api_endpoint,
                api_key: self.payment.api_key,
                secret_key: self.payment.secret_key.clone(),
                contract_code: self.payment.contract_code,
                redirect_url: self.payment.redirect_url,
            },
        );

        let provider = SmsProvider::new(self.number.api_endpoint, self.number.api_key);

        Context {
            app: AppContext {
                host: self.app.host,
                environment: self.app.environment,
                port: self.app.port,
                url: self.app.url,
            },
            db_conn,
            auth: AuthContext {
                access_token_ttl: Duration::minutes(self.auth.access_token_ttl_minutes),
                refresh_token_ttl: Duration::days(self.auth.refresh_token_ttl_days),
            },
            payment: PaymentContext {
                gateway,
                webhook_secret: self.payment.secret_key,
                min_deposit: self.payment.min_deposit,
                max_deposit: self.payment.max_deposit,
                checkout_lifetime: Duration::minutes(self.payment.checkout_lifetime_minutes),
            },
            number: NumberContext {
                provider,
                price_multiplier: self.number.price_multiplier,
                activation_window: Duration::minutes(self.number.activation_window_minutes),
            },
        }
    }
}
