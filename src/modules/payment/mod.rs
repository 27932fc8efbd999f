pub mod gateway;
pub mod job;
pub mod repository;
mod routes;
pub mod service;

pub use routes::{get_router, get_webhook_router};
