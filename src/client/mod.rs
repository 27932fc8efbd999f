//! Typed client for the numhub REST API.
//!
//! [`ApiClient`] owns the session: it attaches the bearer token, refreshes
//! it on 401 with a single shared in-flight refresh, and honours upstream
//! rate limits. [`ApiClient::await_settlement`] polls a deposit until the
//! gateway has decided it.

mod error;
mod session;
mod settlement;

pub use error::Error;
pub use session::{ApiClient, Checkout, LoginResponse, Message, SignUp, TokenPair};
pub use settlement::{SettlementOutcome, SettlementPolicy};
