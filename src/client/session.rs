use super::error::{Error, Result};
use crate::{
    modules::{
        catalog::repository::{Country, ServiceListing},
        number::repository::Activation,
        payment::repository::{Deposit, DepositStatus},
        transaction::repository::Transaction,
        user::repository::User,
        wallet::repository::Wallet,
    },
    utils::pagination::Paginated,
};
use bigdecimal::BigDecimal;
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::{header, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, RwLock},
    time::Instant,
};

const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Checkout {
    pub reference: String,
    pub checkout_url: Option<String>,
    pub amount: BigDecimal,
    pub status: DepositStatus,
}

#[derive(Serialize)]
pub struct SignUp<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

/// Everything needed to send a call again after a token refresh.
#[derive(Clone, Debug)]
struct ApiRequest {
    method: Method,
    path: String,
    body: Option<Value>,
    authenticated: bool,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            authenticated: true,
        }
    }

    fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn public(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// Endpoints whose 401 means bad credentials rather than an expired token.
    fn is_auth_endpoint(&self) -> bool {
        matches!(
            self.path.as_str(),
            "/auth/login" | "/auth/refresh" | "/auth/sign-up"
        )
    }
}

type PendingRefresh = Shared<BoxFuture<'static, Result<TokenPair>>>;

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    tokens: RwLock<Option<TokenPair>>,
    /// Refresh currently in flight, shared by every caller that hit a 401.
    refresh: Mutex<Option<PendingRefresh>>,
    cooldown_until: Mutex<Option<Instant>>,
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| match value.get("error") {
            Some(Value::String(message)) => Some(message.clone()),
            _ => value.get("errors").map(Value::to_string),
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn retry_after(headers: &header::HeaderMap) -> Duration {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

impl ApiClient {
    /// `base_url` points at the API root, e.g. `https://numhub.example/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                http: reqwest::Client::new(),
                base_url: base_url.into().trim_end_matches('/').to_string(),
                tokens: RwLock::new(None),
                refresh: Mutex::new(None),
                cooldown_until: Mutex::new(None),
            }),
        }
    }

    pub async fn set_tokens(&self, tokens: TokenPair) {
        *self.inner.tokens.write().await = Some(tokens);
    }

    pub async fn tokens(&self) -> Option<TokenPair> {
        self.inner.tokens.read().await.clone()
    }

    pub async fn clear_tokens(&self) {
        *self.inner.tokens.write().await = None;
    }

    /// Drops the session only if it still uses `access_token`.
    async fn expire_session(&self, access_token: &str) {
        let mut tokens = self.inner.tokens.write().await;
        if tokens
            .as_ref()
            .is_some_and(|current| current.access_token == access_token)
        {
            *tokens = None;
        }
    }

    async fn check_cooldown(&self) -> Result<()> {
        let mut cooldown = self.inner.cooldown_until.lock().await;
        match *cooldown {
            Some(until) if until > Instant::now() => Err(Error::RateLimited {
                retry_after: until.saturating_duration_since(Instant::now()),
            }),
            Some(_) => {
                *cooldown = None;
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn start_cooldown(&self, retry_after: Duration) {
        tracing::warn!("Rate limited, pausing requests for {:?}", retry_after);
        *self.inner.cooldown_until.lock().await = Some(Instant::now() + retry_after);
    }

    async fn execute(&self, request: &ApiRequest, token: Option<&str>) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.inner.base_url, request.path);
        let mut req = self.inner.http.request(request.method.clone(), url);

        if let Some(token) = token {
            req = req.bearer_auth(token);
        }

        if let Some(body) = &request.body {
            req = req.json(body);
        }

        Ok(req.send().await?)
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let request = ApiRequest::post("/auth/refresh")
            .json(json!({ "token": refresh_token }))
            .public();

        let res = self.execute(&request, None).await.map_err(|err| {
            tracing::warn!("Token refresh could not be sent: {}", err);
            Error::SessionExpired
        })?;

        if !res.status().is_success() {
            tracing::warn!("Token refresh rejected with {}", res.status());
            return Err(Error::SessionExpired);
        }

        res.json::<TokenPair>().await.map_err(|err| {
            tracing::warn!("Token refresh returned an unexpected body: {}", err);
            Error::SessionExpired
        })
    }

    /// Stores a refresh outcome unless the session was replaced or ended while
    /// the refresh was in flight. In that case the current session wins.
    async fn store_refreshed(&self, sent: &str, result: Result<TokenPair>) -> Result<TokenPair> {
        let mut tokens = self.inner.tokens.write().await;
        let still_current = tokens
            .as_ref()
            .is_some_and(|current| current.refresh_token == sent);

        if !still_current {
            tracing::debug!("Session changed during token refresh, keeping the current one");
            return tokens.clone().ok_or(Error::SessionExpired);
        }

        *tokens = result.as_ref().ok().cloned();
        result
    }

    async fn refresh_tokens(self) -> Result<TokenPair> {
        let result = match self.tokens().await {
            Some(tokens) => {
                let result = self.request_refresh(&tokens.refresh_token).await;
                self.store_refreshed(&tokens.refresh_token, result).await
            }
            None => Err(Error::SessionExpired),
        };

        *self.inner.refresh.lock().await = None;

        result
    }

    /// Returns a token pair newer than `stale`, joining the refresh already in
    /// flight or starting one.
    async fn refreshed_since(&self, stale: &str) -> Result<TokenPair> {
        let pending = {
            let mut slot = self.inner.refresh.lock().await;

            match self.tokens().await {
                Some(current) if current.access_token != stale => return Ok(current),
                Some(_) => (),
                None => return Err(Error::SessionExpired),
            }

            match slot.as_ref() {
                Some(pending) => pending.clone(),
                None => {
                    let client = self.clone();
                    let pending = client.refresh_tokens().boxed().shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    async fn into_result<R: DeserializeOwned>(&self, res: reqwest::Response) -> Result<R> {
        let status = res.status();

        if status.is_success() {
            let body = res.bytes().await?;
            return serde_json::from_slice::<R>(&body).map_err(|err| Error::Decode(err.to_string()));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after(res.headers());
            self.start_cooldown(retry_after).await;
            return Err(Error::RateLimited { retry_after });
        }

        let message = error_message(&res.text().await.unwrap_or_default());

        Err(match status {
            StatusCode::UNAUTHORIZED => Error::Unauthorized(message),
            StatusCode::FORBIDDEN => Error::Forbidden(message),
            status if status.is_client_error() => Error::Validation {
                status: status.as_u16(),
                message,
            },
            status => Error::Server {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn send<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        self.check_cooldown().await?;

        let mut token = match request.authenticated {
            true => Some(
                self.tokens()
                    .await
                    .map(|tokens| tokens.access_token)
                    .ok_or(Error::SessionExpired)?,
            ),
            false => None,
        };
        let mut replayed = false;

        loop {
            let res = self.execute(&request, token.as_deref()).await?;

            let refreshable = res.status() == StatusCode::UNAUTHORIZED
                && request.authenticated
                && !request.is_auth_endpoint();

            if !refreshable {
                return self.into_result(res).await;
            }

            if replayed {
                tracing::warn!("{} still unauthorized after refresh", request.path);
                self.expire_session(token.as_deref().unwrap_or_default()).await;
                return Err(Error::SessionExpired);
            }

            let stale = token.take().unwrap_or_default();
            token = Some(self.refreshed_since(&stale).await?.access_token);
            replayed = true;
        }
    }

    pub async fn sign_up(&self, payload: SignUp<'_>) -> Result<Message> {
        self.send(ApiRequest::post("/auth/sign-up").json(json!(payload)).public())
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let login = self
            .send::<LoginResponse>(
                ApiRequest::post("/auth/login")
                    .json(json!({ "email": email, "password": password }))
                    .public(),
            )
            .await?;

        self.set_tokens(TokenPair {
            access_token: login.access_token.clone(),
            refresh_token: login.refresh_token.clone(),
        })
        .await;

        Ok(login)
    }

    /// Ends the session on the server. Local tokens are dropped either way.
    pub async fn logout(&self) -> Result<()> {
        let result = self.send::<Message>(ApiRequest::post("/auth/logout")).await;
        self.clear_tokens().await;
        result.map(|_| ())
    }

    pub async fn profile(&self) -> Result<User> {
        self.send(ApiRequest::get("/users/profile")).await
    }

    pub async fn wallet(&self) -> Result<Wallet> {
        self.send(ApiRequest::get("/wallets/profile")).await
    }

    pub async fn transactions(&self, page: u32, per_page: u32) -> Result<Paginated<Transaction>> {
        self.send(ApiRequest::get(format!(
            "/transactions?page={}&per_page={}",
            page, per_page
        )))
        .await
    }

    pub async fn transaction(&self, id: &str) -> Result<Transaction> {
        self.send(ApiRequest::get(format!(
            "/transactions/{}",
            urlencoding::encode(id)
        )))
        .await
    }

    pub async fn countries(&self) -> Result<Vec<Country>> {
        self.send(ApiRequest::get("/countries").public()).await
    }

    pub async fn services(&self, country_id: i64) -> Result<Vec<ServiceListing>> {
        self.send(ApiRequest::get(format!("/services?country={}", country_id)).public())
            .await
    }

    pub async fn purchase_number(&self, country_id: i64, service_code: &str) -> Result<Activation> {
        self.send(
            ApiRequest::post("/numbers/purchase")
                .json(json!({ "country": country_id, "service": service_code })),
        )
        .await
    }

    pub async fn numbers(&self, page: u32, per_page: u32) -> Result<Paginated<Activation>> {
        self.send(ApiRequest::get(format!(
            "/numbers?page={}&per_page={}",
            page, per_page
        )))
        .await
    }

    pub async fn number(&self, id: &str) -> Result<Activation> {
        self.send(ApiRequest::get(format!("/numbers/{}", urlencoding::encode(id))))
            .await
    }

    pub async fn cancel_number(&self, id: &str) -> Result<Activation> {
        self.send(ApiRequest::post(format!(
            "/numbers/{}/cancel",
            urlencoding::encode(id)
        )))
        .await
    }

    pub async fn finish_number(&self, id: &str) -> Result<Activation> {
        self.send(ApiRequest::post(format!(
            "/numbers/{}/finish",
            urlencoding::encode(id)
        )))
        .await
    }

    pub async fn deposit(&self, amount: BigDecimal) -> Result<Checkout> {
        self.send(ApiRequest::post("/payments/deposit").json(json!({ "amount": amount })))
            .await
    }

    pub async fn verify_deposit(&self, reference: &str) -> Result<Deposit> {
        self.send(ApiRequest::get(format!(
            "/payments/verify/{}",
            urlencoding::encode(reference)
        )))
        .await
    }

    pub async fn deposits(&self, page: u32, per_page: u32) -> Result<Paginated<Deposit>> {
        self.send(ApiRequest::get(format!(
            "/payments?page={}&per_page={}",
            page, per_page
        )))
        .await
    }
}
